use core::cell::RefCell;
use defmt::*;
use embassy_embedded_hal::shared_bus::blocking::i2c::I2cDevice;
use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Async;
use embassy_sync::blocking_mutex::NoopMutex;
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};
use embassy_sync::channel::Channel;
use embassy_time::{Delay, Duration, Timer};
use salt_ms5837::telemetry::BaroData;
use salt_ms5837::units;
use salt_ms5837::{Config, I2cTransport, Ms5837, Oversampling};

pub const SENSOR_CHANNEL_CAPACITY: usize = 8;

// sensor setup
pub const MS5837_CONFIG: Config = Config::bar30()
    .with_fluid_density(units::DENSITY_SALTWATER)
    .with_prom_attempts(3);
pub const MS5837_OSR: Oversampling = Oversampling::Osr4096;

// millisecond wait between readings
const WAIT_TIME: u64 = 50;
// wait before trying to bring the sensor up again
const RETRY_TIME: u64 = 1000;

pub type I2cBus = NoopMutex<RefCell<I2c<'static, Async>>>;
type BaroI2c = I2cDevice<'static, NoopRawMutex, I2c<'static, Async>>;

pub static BARO_CHANNEL: Channel<CriticalSectionRawMutex, BaroData, SENSOR_CHANNEL_CAPACITY> = Channel::new();

#[embassy_executor::task]
pub async fn ms5837_task(i2c_bus: &'static I2cBus) {
    let mut sensor = setup_ms5837(i2c_bus).await;

    loop {
        // D1 and D2 are converted back to back, the conversion waits block this task
        match sensor.read_raw(MS5837_OSR) {
            Ok(reading) => {
                let data = BaroData::from_reading(&reading, sensor.fluid_density());

                debug!("MS5837 Data: T = {} C, P = {} mbar", data.temperature, data.pressure);
                BARO_CHANNEL.send(data).await;
            }
            Err(e) => {
                error!("Failed to read MS5837: {}", Debug2Format(&e));
            }
        }

        Timer::after(Duration::from_millis(WAIT_TIME)).await;
    }
}

/// Keep trying until the sensor answers with a PROM that passes its CRC.
async fn setup_ms5837(i2c_bus: &'static I2cBus) -> Ms5837<I2cTransport<BaroI2c, Delay>> {
    loop {
        // initialize consumes the device handle, so each attempt gets a new one
        let transport = I2cTransport::new(I2cDevice::new(i2c_bus), Delay);
        match Ms5837::initialize(transport, MS5837_CONFIG) {
            Ok(sensor) => {
                info!("{} ready, PROM = {:#06x}", MS5837_CONFIG.model.name(), sensor.calibration().words());
                return sensor;
            }
            Err(e) => {
                error!("Failed to initialize MS5837: {}", Debug2Format(&e));
            }
        }

        Timer::after(Duration::from_millis(RETRY_TIME)).await;
    }
}
