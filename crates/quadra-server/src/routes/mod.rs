pub mod events;
pub mod invitations;
pub mod members;
