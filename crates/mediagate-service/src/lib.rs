//! # mediagate-service
//!
//! The access decision core: the rule evaluator, the token lifecycle
//! manager, the delivery dispatcher, the request gateway that
//! sequences them, and the typed runtime-settings facade.

pub mod delivery;
pub mod gateway;
pub mod rules;
pub mod settings;
pub mod token;
