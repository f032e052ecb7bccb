pub mod goal;
pub mod shell;
