pub(crate) mod account;
pub(crate) mod commits;
pub(crate) mod pulls;
pub(crate) mod repo;
pub(crate) mod shared;
pub(crate) mod users;
