//! Panel core: controller transport plus the UI-independent control logic
//! (input pipelines, direction buttons, gauge geometry, bootstrap sync).

pub mod bootstrap;
pub mod config;
pub mod direction;
pub mod error;
pub mod gauge;
pub mod pipeline;
pub mod retry;
pub mod session;
pub mod transport;

pub use bootstrap::{BootstrapPolicy, BootstrapSync};
pub use config::{load_settings, PanelSettings};
pub use direction::{ButtonStates, DirectionButton, DirectionStateMachine};
pub use error::TransportError;
pub use gauge::{GaugeRenderer, GaugeScene, SurfaceSize};
pub use pipeline::{InputPipeline, PipelineKind, RangeUpdate};
pub use retry::RetryPolicy;
pub use session::{ControlSession, SessionSettings};
pub use transport::{
    CommandSink, SendOutcome, TransportConfig, TransportEvent, TransportHandle,
};
