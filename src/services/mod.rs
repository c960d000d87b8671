pub mod appeals;
pub mod assignments;
pub mod grading;
pub mod overrides;
pub mod prerequisites;
pub mod submissions;

pub use appeals::AppealService;
pub use assignments::AssignmentService;
pub use overrides::OverrideService;
pub use prerequisites::PrerequisiteGate;
pub use submissions::SubmissionService;
