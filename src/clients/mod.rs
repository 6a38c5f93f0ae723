pub mod marzban;
pub use marzban::PanelClient;
