#![no_std]
#![no_main]
#![allow(async_fn_in_trait)]
#![feature(impl_trait_in_assoc_type)]

use embassy_executor::Spawner;
use {defmt_rtt as _, panic_probe as _};

use crate::tasks::{
    AssignedResources, DriveBaseResources, LedRingResources, ProximityResources, SelectorResources, SerialResources,
    control, drive_base, proximity, serial,
};

mod tasks;

// Program metadata for `picotool info`.
#[unsafe(link_section = ".bi_entries")]
#[used]
pub static PICOTOOL_ENTRIES: [embassy_rp::binary_info::EntryAddr; 4] = [
    embassy_rp::binary_info::rp_program_name!(c"Puck"),
    embassy_rp::binary_info::rp_program_description!(c"Obstacle avoiding robot that streams camera images over serial"),
    embassy_rp::binary_info::rp_cargo_version!(),
    embassy_rp::binary_info::rp_program_build_attribute!(),
];

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    let r = split_resources!(p);

    serial::init(spawner, r.serial).await;
    proximity::init(spawner, r.proximity).await;
    drive_base::init(spawner, r.drive_base).await;
    control::init(spawner, r.selector, r.leds).await
}
