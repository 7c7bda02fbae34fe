pub mod car;
pub mod driver;
pub mod error;
pub mod events;
pub mod handle_race;
pub mod kinematics;
pub mod overtake;
pub mod race;
pub mod state_handler;
pub mod strategy;
pub mod team;
pub mod tireset;
pub mod track;
