pub mod connection;

pub use connection::handle_socket;
