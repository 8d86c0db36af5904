#![no_std]
#![no_main]

mod sensors;
mod usb_serial;

use core::cell::RefCell;
use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::{bind_interrupts, i2c, peripherals, Config};
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::time::Hertz;
use embassy_sync::blocking_mutex::NoopMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pubsub::{PubSubBehavior, PubSubChannel};
use embassy_time::Timer;
use salt_ms5837::telemetry::BaroData;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

// Sensors
use crate::sensors::*;

// USB
use crate::usb_serial::*;

static I2C_BUS: StaticCell<I2cBus> = StaticCell::new();

// Everything a telemetry consumer gets per tick
#[derive(Clone, Default)]
pub struct SensorPacket {
    pub baro: BaroData,
    pub fresh: bool, // false if the sensor task produced nothing since last tick
}

pub const SENSOR_SUBSCRIBERS: usize = 3; // how many subscribers to this channel
pub const SENSOR_PUBLISHERS: usize = 1;  // how many publishers (senders)
pub static SENSOR_PUBSUB: PubSubChannel<CriticalSectionRawMutex, SensorPacket, 8, SENSOR_SUBSCRIBERS, SENSOR_PUBLISHERS> = PubSubChannel::new();

bind_interrupts!(struct Irqs {
    I2C1_EV => i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => i2c::ErrorInterruptHandler<peripherals::I2C1>;
});

// Main function and entry point of the program after configuration
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut config = Config::default();
    {
        use embassy_stm32::rcc::*;
        config.rcc.hsi = true;
        config.rcc.pll1 = Some(Pll {
            source: PllSource::HSI, // 16 MHz
            prediv: PllPreDiv::DIV1,
            mul: PllMul::MUL10,
            divp: None,
            divq: None,
            divr: Some(PllDiv::DIV1), // 160 MHz
        });
        config.rcc.sys = Sysclk::PLL1_R;
        config.rcc.voltage_range = VoltageScale::RANGE1;
        config.rcc.hsi48 = Some(Hsi48Config { sync_from_usb: true }); // needed for USB
        config.rcc.mux.iclksel = mux::Iclksel::HSI48; // USB uses ICLK (48MHz)
    }

    // Setup peripherals on the default clock
    let p = embassy_stm32::init(config);

    // Set up user led as output
    let mut led = Output::new(p.PE2, Level::Low, Speed::Medium);

    // Use I2C1 for sensors, MS5837 supports up to 400 kHz
    let i2c = I2c::new(p.I2C1, p.PB6, p.PB3, Irqs, p.GPDMA1_CH4, p.GPDMA1_CH5, Hertz(100_000), Default::default());

    let i2c_bus = NoopMutex::new(RefCell::new(i2c));
    let i2c_bus = I2C_BUS.init(i2c_bus);

    spawner.spawn(ms5837_task(i2c_bus)).unwrap();
    spawner.spawn(aggregator_task()).unwrap();

    info!("Sensor tasks spawned");

    setup_usb(p.USB, p.PA12, p.PA11, &SENSOR_PUBSUB).await;

    loop {
        led.set_high();
        Timer::after_millis(500).await;
        led.set_low();
        Timer::after_millis(500).await;
    }
}

#[embassy_executor::task]
async fn aggregator_task() {
    let mut last = BaroData::default();

    loop {
        // Drain to the newest reading, the sensor runs faster than we publish
        let mut fresh = false;
        while let Ok(data) = BARO_CHANNEL.try_receive() {
            last = data;
            fresh = true;
        }
        if !fresh {
            info!("No new MS5837 data");
        }

        let data_packet = SensorPacket {
            baro: last.clone(),
            fresh,
        };

        // Broadcast this packet to telemetry consumers (data storage, radio, CAN)
        // This will publish without waiting for an empty slot. change to a publisher to correctly wait for space with "publish()"
        SENSOR_PUBSUB.publish_immediate(data_packet);

        // adjust timer based on how fast each subscriber needs the data
        Timer::after_millis(100).await;
    }
}
