pub mod authorization_service;
pub mod identity_provider;
pub mod memory;
pub mod profile_store;
pub mod provisioning_service;
