pub mod case;
pub mod case_profile;
pub mod enums;
