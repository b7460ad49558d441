//! Route handlers organized by resource

pub mod access;
pub mod companies;
pub mod health;
pub mod icp;
pub mod jobs;
pub mod opportunities;
pub mod pages;
pub mod people;
pub mod roles;
pub mod tags;
pub mod teams;
pub mod tenants;
pub mod users;
