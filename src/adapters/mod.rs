//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements         | Connects to                  |
//! |---------------|--------------------|------------------------------|
//! | `hardware`    | MotionSensorPort   | PIR on GPIO                  |
//! |               | DoorActuatorPort   | Servo on LEDC PWM            |
//! |               | DisplayPort        | via `log_display`            |
//! |               | LinkPort           | via `wifi`                   |
//! |               | ClockPort          | via `time`                   |
//! | `log_display` | DisplayPort        | Serial log output            |
//! | `wifi`        | LinkPort           | ESP-IDF WiFi STA             |
//! | `time`        | ClockPort          | esp_timer + SNTP             |
//! | `nvs`         | ConfigPort         | NVS / in-memory store        |
//! |               | RegionStore        | NVS blob (`NvsRegion`)       |
//! | `file_store`  | FileStore          | SPIFFS / host filesystem     |
//! | `http`        | HttpPort           | esp_http_client              |
//! | `ws_session`  | SessionTransport   | esp_websocket_client         |

pub mod file_store;
pub mod hardware;
pub mod http;
pub mod log_display;
pub mod nvs;
pub mod time;
pub(super) mod utils;
pub mod wifi;
pub mod ws_session;
