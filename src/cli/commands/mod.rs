//! One module per subcommand.

pub mod bulk;
pub mod cat;
pub mod change_password;
pub mod check_paths;
pub mod decrypt;
pub mod edit;
pub mod encrypt;
pub mod new;
