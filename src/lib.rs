//! CRUD data access over a relational engine (guarded writes) and a
//! document store, behind one [`db::CrudFacade`] contract.

pub mod cli;
pub mod config;
pub mod db;
