#![no_main]
use libfuzzer_sys::fuzz_target;
use pv_switcher::config::RegisterFormat;

fuzz_target!(|data: &[u8]| {
    // Interpret the input as u16 register stream in big-endian pairs
    let regs: Vec<u16> = data
        .chunks_exact(2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .collect();

    for format in [
        RegisterFormat::U16,
        RegisterFormat::S16,
        RegisterFormat::U32,
        RegisterFormat::S32,
    ] {
        let _ = pv_switcher::modbus::decode_power_watts(&regs, format);
    }
});
