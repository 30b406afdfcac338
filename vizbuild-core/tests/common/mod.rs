//! Shared fixtures: a complete, valid visual package in a temp dir and
//! recording compilers.

#![allow(dead_code)]

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Semaphore;
use vizbuild_core::package::load_visual_package;
use vizbuild_core::adapters::{FsWritePort, JsonSchemaValidator};
use vizbuild_core::ports::{CompileService, WritePort};
use vizbuild_core::{BuildOptions, BuilderSettings, ValidationError, VisualBuilder, VisualPackage};

pub const GUID: &str = "sampleVisual1234";

/// Minimal PNG: signature plus an IHDR chunk of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes
}

pub struct Fixture {
    _temp: TempDir,
    pub root: Utf8PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp dir");
        let fixture = Self { _temp: temp, root };

        fixture.write_json(
            "pbiviz.json",
            &json!({
                "visual": {
                    "name": "sampleVisual",
                    "displayName": "Sample Visual",
                    "guid": GUID,
                    "visualClassName": "Visual",
                    "version": "1.0.0"
                },
                "apiVersion": "1.7.0",
                "author": { "name": "Sample Author", "email": "author@example.com" },
                "assets": { "icon": "assets/icon.png" },
                "externalJS": [],
                "style": "style/visual.less",
                "capabilities": "capabilities.json",
                "dependencies": "dependencies.json",
                "stringResources": []
            }),
        );
        fixture.write_json(
            "tsconfig.json",
            &json!({
                "compilerOptions": { "target": "ES5", "sourceMap": true },
                "files": [".api/v1.7.0/PowerBI-visuals.d.ts", "src/visual.ts"]
            }),
        );
        fixture.write_json(
            "capabilities.json",
            &json!({
                "dataRoles": [{ "displayName": "Category", "name": "category", "kind": "Grouping" }],
                "dataViewMappings": [{ "table": { "rows": { "for": { "in": "category" } } } }]
            }),
        );
        fixture.write("assets/icon.png", png(20, 20));
        fixture.write("src/visual.ts", "export class Visual {}\n");
        fixture.write("style/visual.less", ".visual { color: red; }\n");

        fixture.write(".api/v1.7.0/PowerBI-visuals.d.ts", "declare namespace powerbi {}\n");
        fixture.write_json(
            ".api/v1.7.0/schema.capabilities.json",
            &json!({
                "type": "object",
                "required": ["dataRoles"],
                "properties": {
                    "dataRoles": { "type": "array" },
                    "dataViewMappings": { "type": "array" }
                }
            }),
        );
        fixture.write_json(
            ".api/v1.7.0/schema.dependencies.json",
            &json!({
                "type": "object",
                "properties": {
                    "cranPackages": {
                        "type": "array",
                        "items": { "type": "object", "required": ["name"] }
                    }
                }
            }),
        );
        fixture.write_json(
            ".api/v1.7.0/schema.stringResources.json",
            &json!({
                "type": "object",
                "required": ["locale", "values"],
                "properties": {
                    "locale": { "type": "string" },
                    "values": { "type": "object" }
                }
            }),
        );

        fixture.write(".tmp/drop/visual.prod.js", "var visual = 1;");
        fixture.write(".tmp/drop/visual.prod.css", ".visual{color:red}");
        fixture
    }

    pub fn path(&self, rel: &str) -> Utf8PathBuf {
        self.root.join(rel)
    }

    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(&path, contents).expect("write fixture file");
    }

    pub fn write_json(&self, rel: &str, value: &Value) {
        self.write(rel, serde_json::to_string_pretty(value).expect("serialize"));
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).expect("read fixture file")
    }

    pub fn read_json(&self, rel: &str) -> Value {
        serde_json::from_str(&self.read(rel)).expect("parse fixture json")
    }

    /// Rewrites `pbiviz.json` in place.
    pub fn edit_config(&self, edit: impl FnOnce(&mut Value)) {
        let mut config = self.read_json("pbiviz.json");
        edit(&mut config);
        self.write_json("pbiviz.json", &config);
    }

    pub fn manifest(&self) -> Value {
        self.read_json(".tmp/drop/pbiviz.json")
    }

    pub fn status(&self) -> String {
        self.read(".tmp/drop/status")
    }

    pub fn has(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub async fn package(&self) -> VisualPackage {
        load_visual_package(&self.root).await.expect("load package")
    }

    pub async fn builder(
        &self,
        options: BuildOptions,
        style: Arc<RecordingCompiler>,
        script: Arc<RecordingCompiler>,
    ) -> VisualBuilder {
        self.builder_with(options, BuilderSettings::default(), style, script)
            .await
    }

    pub async fn builder_with(
        &self,
        options: BuildOptions,
        settings: BuilderSettings,
        style: Arc<RecordingCompiler>,
        script: Arc<RecordingCompiler>,
    ) -> VisualBuilder {
        VisualBuilder::new(self.package().await, options, settings, style, script)
    }

    /// Like [`builder`](Self::builder) but writing through `writer`.
    pub async fn builder_writing_to(
        &self,
        writer: Arc<dyn WritePort>,
        style: Arc<RecordingCompiler>,
        script: Arc<RecordingCompiler>,
    ) -> VisualBuilder {
        VisualBuilder::with_ports(
            self.package().await,
            BuildOptions::default(),
            BuilderSettings::default(),
            style,
            script,
            Arc::new(JsonSchemaValidator),
            writer,
        )
    }
}

/// Filesystem writer that lingers mid-write and tracks how many writes
/// overlap.
#[derive(Default)]
pub struct OverlapWriter {
    inner: FsWritePort,
    writes: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl OverlapWriter {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WritePort for OverlapWriter {
    async fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // Half the bytes first, so an overlapping write would tear the file.
        let half = contents.len() / 2;
        let result = async {
            self.inner.write_file(path, &contents[..half]).await?;
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.inner.write_file(path, contents).await
        }
        .await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Shared invocation log across compilers, in call order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Compiler double that records calls and tracks overlap.
pub struct RecordingCompiler {
    name: String,
    log: CallLog,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
    gate: Option<Arc<Semaphore>>,
    failure: Option<Vec<ValidationError>>,
}

impl RecordingCompiler {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            log: Arc::clone(log),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay: Duration::ZERO,
            gate: None,
            failure: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Each compile waits for one permit on `gate`.
    pub fn gated(mut self, gate: &Arc<Semaphore>) -> Self {
        self.gate = Some(Arc::clone(gate));
        self
    }

    pub fn failing(mut self, errors: Vec<ValidationError>) -> Self {
        self.failure = Some(errors);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompileService for RecordingCompiler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn compile(
        &self,
        _package: &VisualPackage,
        _options: &BuildOptions,
    ) -> Result<(), Vec<ValidationError>> {
        self.log.lock().unwrap().push(self.name.clone());
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate open").forget();
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match &self.failure {
            Some(errors) => Err(errors.clone()),
            None => Ok(()),
        }
    }
}

pub fn compilers() -> (CallLog, Arc<RecordingCompiler>, Arc<RecordingCompiler>) {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let style = Arc::new(RecordingCompiler::new("style", &log));
    let script = Arc::new(RecordingCompiler::new("script", &log));
    (log, style, script)
}

/// Polls `cond` every millisecond for up to five seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..5000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached in time");
}

pub fn rel(path: &str) -> &Utf8Path {
    Utf8Path::new(path)
}
