pub mod assignment_store;
pub mod pool;
pub mod question_store;
