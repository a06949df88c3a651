pub mod provisioning_dto;
