#![no_main]
use libfuzzer_sys::fuzz_target;

// The first byte splits the input in pattern and subject.
fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else { return };
    let split = (split as usize).min(rest.len());
    let (pattern, subject) = rest.split_at(split);

    let Ok(pattern) = std::str::from_utf8(pattern) else { return };
    let Ok(machine) = retrack::Machine::new(pattern) else { return };
    let machine = machine.step_limit(Some(1_000_000));

    for m in machine.find_iter(subject) {
        let Ok(m) = m else { break };
        assert!(m.begin() <= m.end() && m.end() <= subject.len());
    }
});
