pub mod assignments;
pub mod delete;
pub mod grade;
pub mod history;
pub mod init;
pub mod publish;
pub mod reset;
pub mod submissions;
pub mod submit;
pub mod summary;
pub mod validate;
