pub mod executor;
pub mod identity;
pub mod matcher;
pub mod traversal;
pub mod work_queue;
