pub mod access_lock;
pub mod logging;
pub mod path_store;
pub mod rpc_validator;
