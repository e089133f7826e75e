pub mod classify;
pub mod participant;
pub mod response;
pub mod stimulus;
pub mod trial;

pub use classify::classify;
pub use participant::Participant;
pub use response::Response;
pub use stimulus::StimulusDescriptor;
pub use trial::TrialRecord;
