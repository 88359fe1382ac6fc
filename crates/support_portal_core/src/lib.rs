pub mod domain;
pub mod lifecycle;
pub mod messages;
pub mod ports;
pub mod session;

pub use domain::{
    Complaint, ComplaintId, ComplaintPatch, ComplaintStats, ComplaintStatus, Credentials,
    Identity, NewComplaint, Priority, Registration, Role, SeverityScore, StatusFilter, UserId,
};
pub use lifecycle::{ComplaintLifecycle, LifecycleError, ListScope, ResolutionDraft};
pub use ports::{
    AuthService, ComplaintService, FieldError, PortError, PortResult, SessionPersistence,
    ValidationErrors,
};
pub use session::SessionStore;
