pub mod classifier;
pub mod runs_actor;
pub mod scheduler;
pub mod step;
pub mod workflow;

pub use classifier::LeadClassifier;
pub use runs_actor::RunsHandle;
pub use step::StepPolicy;
pub use workflow::Workflow;
