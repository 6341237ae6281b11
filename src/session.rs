//! Debug session: one memory source, one bound parser, serialized scans
//!
//! The memory source is a single exclusive channel, so every scan holds it
//! behind a FIFO `tokio::sync::Mutex` for its whole duration. Backend reads
//! block, so the decode itself runs on the blocking pool while the async
//! side waits. Each scan is stamped with a generation number; a scan
//! overtaken by a newer request reports [`ScanOutcome::Superseded`] instead
//! of its (stale) result.

use crate::config::ScannerConfig;
use crate::core::types::{
    Abi, Address, ClassHierarchy, OutputStyle, RttiError, RttiResult, TargetPlatform,
};
use crate::memory::{MemoryReader, MemorySource};
use crate::rtti::{DecodeOptions, RttiParser, SymbolUndecorator};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Generation stamp of one scan request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScanTicket(u64);

impl ScanTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Result of a scan that ran to the end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed(ClassHierarchy),
    /// A newer scan was requested; this one's output was discarded
    Superseded,
}

impl ScanOutcome {
    pub fn hierarchy(&self) -> Option<&ClassHierarchy> {
        match self {
            ScanOutcome::Completed(hierarchy) => Some(hierarchy),
            ScanOutcome::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, ScanOutcome::Superseded)
    }
}

/// An open debug session
pub struct DebugSession {
    source: Arc<Mutex<Box<dyn MemorySource>>>,
    platform: TargetPlatform,
    parser: RttiParser,
    undecorator: Arc<dyn SymbolUndecorator>,
    style: OutputStyle,
    generation: AtomicU64,
}

impl DebugSession {
    /// Opens a session and binds the parser to the platform's ABI
    pub fn open(
        source: Box<dyn MemorySource>,
        platform: TargetPlatform,
        undecorator: Arc<dyn SymbolUndecorator>,
        config: &ScannerConfig,
    ) -> RttiResult<Self> {
        let mut parser = RttiParser::new(DecodeOptions::from(config));
        parser.bind(platform.abi())?;

        info!(
            ?platform,
            width = source.pointer_width().bytes(),
            "Debug session opened"
        );
        Ok(DebugSession {
            source: Arc::new(Mutex::new(source)),
            platform,
            parser,
            undecorator,
            style: OutputStyle::Auto,
            generation: AtomicU64::new(0),
        })
    }

    /// Opens a session, detecting the platform from the source's image name
    pub fn detect(
        source: Box<dyn MemorySource>,
        undecorator: Arc<dyn SymbolUndecorator>,
        config: &ScannerConfig,
    ) -> RttiResult<Self> {
        let name = source.image_name().ok_or_else(|| {
            RttiError::UnsupportedPlatform("target reports no image name".to_string())
        })?;
        let platform = TargetPlatform::from_image_name(&name)?;
        Self::open(source, platform, undecorator, config)
    }

    /// Sets the style used by [`render`](Self::render)
    pub fn with_style(mut self, style: OutputStyle) -> Self {
        self.style = style;
        self
    }

    pub fn platform(&self) -> TargetPlatform {
        self.platform
    }

    pub fn abi(&self) -> Abi {
        self.platform.abi()
    }

    pub fn style(&self) -> OutputStyle {
        self.style
    }

    /// Releases the parser; later scans fail with `ParserUnbound`
    pub fn close(&mut self) {
        self.parser.release();
    }

    /// Registers a new scan request, superseding all earlier ones
    pub fn begin_scan(&self) -> ScanTicket {
        ScanTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Generation of the most recent request
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_current(&self, ticket: ScanTicket) -> bool {
        self.current_generation() == ticket.0
    }

    /// Runs the scan registered as `ticket` on the textual object address
    pub async fn scan_with(&self, ticket: ScanTicket, text: &str) -> RttiResult<ScanOutcome> {
        let source = self.source.clone().lock_owned().await;
        if !self.is_current(ticket) {
            debug!(generation = ticket.0, "Scan superseded before start");
            return Ok(ScanOutcome::Superseded);
        }

        let parser = self.parser.clone();
        let undecorator = self.undecorator.clone();
        let input = text.to_string();
        // The guard moves into the task so the source stays locked until it ends
        let joined = tokio::task::spawn_blocking(move || {
            decode_object(&parser, undecorator.as_ref(), &**source, &input)
        })
        .await;
        let result = joined.map_err(RttiError::from).and_then(|result| result);

        if !self.is_current(ticket) {
            debug!(generation = ticket.0, "Discarding superseded scan output");
            return Ok(ScanOutcome::Superseded);
        }

        match result {
            Ok(hierarchy) => Ok(ScanOutcome::Completed(hierarchy)),
            Err(e) => {
                warn!(generation = ticket.0, "Scan of {} failed: {}", text, e);
                Err(e)
            }
        }
    }

    /// Starts and runs a scan in one step
    pub async fn scan(&self, text: &str) -> RttiResult<ScanOutcome> {
        let ticket = self.begin_scan();
        self.scan_with(ticket, text).await
    }

    /// Output lines of `hierarchy` in the session's style
    pub fn render(&self, hierarchy: &ClassHierarchy) -> Vec<String> {
        hierarchy.lines(self.style)
    }
}

fn decode_object(
    parser: &RttiParser,
    undecorator: &dyn SymbolUndecorator,
    source: &dyn MemorySource,
    text: &str,
) -> RttiResult<ClassHierarchy> {
    let width = source.pointer_width();
    let object = Address::parse(text, width)?;
    if !object.is_plausible(width) {
        return Err(RttiError::InvalidAddress(object.display(width).to_string()));
    }

    let vtable = MemoryReader::new(source).read_pointer(object)?;
    debug!(%object, %vtable, "Resolved object vtable");
    parser.decode(source, undecorator, vtable)
}

impl Drop for DebugSession {
    fn drop(&mut self) {
        self.close();
    }
}
