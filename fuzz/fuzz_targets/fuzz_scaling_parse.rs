#![no_main]
use libfuzzer_sys::fuzz_target;
use pv_switcher::scaling::ScalingTable;

fuzz_target!(|data: &[u8]| {
    let table = ScalingTable::parse(&String::from_utf8_lossy(data));
    for day in [0, 1, 172, 366, u32::MAX] {
        let factor = table.factor_for_day(day);
        assert!(factor.is_finite() && factor >= 0.0);
    }
});
