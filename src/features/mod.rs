pub mod feedback;

pub use feedback::{ConfigurationStatus, FeedbackService};
