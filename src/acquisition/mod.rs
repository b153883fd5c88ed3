pub mod controller;
pub mod host;
pub mod pipeline;
pub mod presenter;
pub mod state;

pub use controller::{AcquisitionController, AttemptOutcome};
pub use host::{ChangeSubscription, FixtureDocument, HostDocument};
pub use pipeline::{evaluate, WorkSummary};
pub use presenter::{ConsolePresenter, Presenter};
pub use state::{AcquisitionSession, AcquisitionStatus};
