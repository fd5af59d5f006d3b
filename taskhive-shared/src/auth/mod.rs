/// Authentication and authorization
///
/// - `jwt`: Bearer token validation (issuance is external)
/// - `actor`: The authenticated actor — user plus roles and permissions
/// - `policy`: Pure access-policy predicates and gates

pub mod actor;
pub mod jwt;
pub mod policy;

pub use actor::Actor;
pub use policy::PolicyError;
