pub mod address_book;
pub mod collection;
pub mod manifest;
pub mod notification;
pub mod report;
pub mod settings;
pub mod shipment;
pub mod user;
pub mod ws;
