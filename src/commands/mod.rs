pub mod fix_broken;
pub mod update;
