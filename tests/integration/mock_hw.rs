//! Mock adapters for integration tests.
//!
//! Each mock records what the service asked of it so tests can assert on
//! the full call history without touching GPIO, flash or sockets.

use std::collections::VecDeque;

use pochtomat::app::context::DeviceContext;
use pochtomat::app::ports::{
    ClockPort, DisplayPort, DoorActuatorPort, FileStore, HttpError, HttpPort, HttpResponse,
    LinkPort, MotionSensorPort, RegionStore, SessionFrame, SessionTransport,
};
use pochtomat::app::service::MailboxService;
use pochtomat::config::SystemConfig;
use pochtomat::error::{SessionError, StorageError};
use pochtomat::identity::IdentityStore;

/// 2024-05-01 08:00:00 UTC.
pub const EPOCH: u64 = 1_714_550_400;

// ── Board ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorCall {
    Open,
    Close,
}

pub struct MockBoard {
    pub now_ms: u64,
    pub epoch_secs: u64,
    pub motion: bool,
    pub link_up: bool,
    pub link_connectable: bool,
    pub door_calls: Vec<DoorCall>,
    pub screens: Vec<Vec<String>>,
    pub resyncs: u32,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            epoch_secs: EPOCH,
            motion: false,
            link_up: true,
            link_connectable: true,
            door_calls: Vec::new(),
            screens: Vec::new(),
            resyncs: 0,
        }
    }

    pub fn opens(&self) -> usize {
        self.door_calls.iter().filter(|c| **c == DoorCall::Open).count()
    }

    pub fn closes(&self) -> usize {
        self.door_calls.iter().filter(|c| **c == DoorCall::Close).count()
    }

    pub fn last_screen(&self) -> Option<&[String]> {
        self.screens.last().map(Vec::as_slice)
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionSensorPort for MockBoard {
    fn sample(&mut self) -> bool {
        self.motion
    }
}

impl DoorActuatorPort for MockBoard {
    fn set_open(&mut self, open: bool) {
        self.door_calls
            .push(if open { DoorCall::Open } else { DoorCall::Close });
    }
}

impl DisplayPort for MockBoard {
    fn render(&mut self, lines: &[&str]) {
        self.screens
            .push(lines.iter().map(|l| (*l).to_string()).collect());
    }
}

impl LinkPort for MockBoard {
    fn is_up(&self) -> bool {
        self.link_up
    }

    fn connect(&mut self) -> bool {
        self.link_up = self.link_connectable;
        self.link_up
    }
}

impl ClockPort for MockBoard {
    fn uptime_ms(&self) -> u64 {
        self.now_ms
    }

    fn epoch_secs(&self) -> u64 {
        self.epoch_secs
    }

    fn resync(&mut self) -> bool {
        self.resyncs += 1;
        true
    }
}

// ── Session transport ─────────────────────────────────────────

#[derive(Default)]
pub struct MockTransport {
    pub refuse_connect: bool,
    pub connected: bool,
    pub connects: u32,
    pub closes: u32,
    pub pings: u32,
    pub sent: Vec<String>,
    pub inbound: VecDeque<SessionFrame>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn push_text(&mut self, text: &str) {
        self.inbound.push_back(SessionFrame::Text(text.to_string()));
    }

    pub fn sent_matching(&self, needle: &str) -> usize {
        self.sent.iter().filter(|m| m.contains(needle)).count()
    }
}

impl SessionTransport for MockTransport {
    fn connect(&mut self, _url: &str, _timeout_ms: u32) -> Result<(), SessionError> {
        self.connects += 1;
        if self.refuse_connect {
            return Err(SessionError::ConnectFailed);
        }
        self.connected = true;
        Ok(())
    }

    fn send_text(&mut self, payload: &str) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        self.sent.push(payload.to_string());
        Ok(())
    }

    fn send_ping(&mut self) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        self.pings += 1;
        Ok(())
    }

    fn poll(&mut self) -> Option<SessionFrame> {
        self.inbound.pop_front()
    }

    fn close(&mut self) {
        self.connected = false;
        self.closes += 1;
    }
}

// ── HTTP ──────────────────────────────────────────────────────

pub struct MockHttp {
    pub reply: Result<HttpResponse, HttpError>,
    pub requests: Vec<String>,
}

#[allow(dead_code)]
impl MockHttp {
    pub fn failing() -> Self {
        Self {
            reply: Err(HttpError::Connect),
            requests: Vec::new(),
        }
    }

    pub fn created(id: &str) -> Self {
        Self {
            reply: Ok(HttpResponse {
                status: 201,
                body: id.to_string(),
            }),
            requests: Vec::new(),
        }
    }
}

impl HttpPort for MockHttp {
    fn post_json(
        &mut self,
        _url: &str,
        body: &[u8],
        _timeout_ms: u32,
    ) -> Result<HttpResponse, HttpError> {
        self.requests
            .push(String::from_utf8_lossy(body).into_owned());
        self.reply.clone()
    }
}

// ── Stores ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MemRegion {
    pub bytes: [u8; 16],
    pub fail_commit: bool,
}

impl Default for MemRegion {
    fn default() -> Self {
        Self {
            bytes: [0xFF; 16],
            fail_commit: false,
        }
    }
}

impl RegionStore for MemRegion {
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let end = offset + buf.len();
        let src = self.bytes.get(offset..end).ok_or(StorageError::OutOfBounds)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        let end = offset + data.len();
        let dst = self
            .bytes
            .get_mut(offset..end)
            .ok_or(StorageError::OutOfBounds)?;
        dst.copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        if self.fail_commit {
            Err(StorageError::IoError)
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Default)]
pub struct MemFile {
    pub contents: Option<String>,
}

impl FileStore for MemFile {
    fn read_to_string(&self) -> Result<String, StorageError> {
        self.contents.clone().ok_or(StorageError::NotFound)
    }

    fn write_all(&mut self, contents: &str) -> Result<(), StorageError> {
        self.contents = Some(contents.to_string());
        Ok(())
    }
}

// ── Service harness ───────────────────────────────────────────

pub type TestService = MailboxService<MockTransport, MockHttp, MemRegion, MemFile>;

#[allow(dead_code)]
pub fn service_with(
    config: SystemConfig,
    http: MockHttp,
    region: MemRegion,
    file: MemFile,
) -> TestService {
    MailboxService::new(
        config,
        MockTransport::default(),
        http,
        IdentityStore::new(region, file),
    )
}

/// Region holding a valid identity record for `id`.
#[allow(dead_code)]
pub fn region_with(id: u32) -> MemRegion {
    let mut region = MemRegion::default();
    let mut store = IdentityStore::new(region.clone(), MemFile::default());
    if let Some(dev) = pochtomat::identity::DeviceId::from_raw(i64::from(id)) {
        store.save(dev).expect("mem stores never fail");
        region = store.region().clone();
    }
    region
}

#[allow(dead_code)]
pub fn door_open(ctx: &DeviceContext) -> bool {
    ctx.door == pochtomat::app::context::DoorState::Open
}
