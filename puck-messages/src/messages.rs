pub mod host_to_puck;
pub mod puck_to_host;
