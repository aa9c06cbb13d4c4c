use packed_bools::{BitVectorError, BoolVector, bits};

fn main() {
    println!("=== Packed Bools Examples ===\n");

    // Example 1: Attendance flags
    let _ = example_attendance();

    // Example 2: Walking bits with a cursor
    example_cursor();

    // Example 3: Memory comparison
    let _ = example_memory_savings();
}

fn example_attendance() -> Result<(), BitVectorError> {
    println!("Example 1: Daily attendance, one bit per day");

    let mut days = BoolVector::new();
    for day in 0..30 {
        days.push(day % 7 != 5 && day % 7 != 6)?;
    }

    println!("  Days recorded: {}", days.len());
    println!("  Days present:  {}", days.count_ones());
    println!("  Day 12 present: {}", days.at(12)?);

    // Late correction for day 12
    days.set(12, false)?;
    println!("  Day 12 after correction: {}", days[12]);
    println!();

    Ok(())
}

fn example_cursor() {
    println!("Example 2: Cursor arithmetic across byte boundaries");

    let mut v = bits![
        true, false, true, true, false, false, false, true, false, true, true, true, false, false,
        true, false, true
    ];
    let (first, last) = v.span();
    let ninth = first + 9;

    println!("  Distance begin..end: {}", last - first);
    println!("  Bit 9 lives in byte {:p}, bit {}", ninth.byte_ptr(), ninth.bit());
    println!("  Bit 9 value: {}", ninth.read());

    let mut walker = ninth;
    walker.dec().dec();
    println!("  Two steps back: bit offset {}, value {}", walker.bit(), walker.read());
    println!();
}

fn example_memory_savings() -> Result<(), BitVectorError> {
    println!("Example 3: Memory savings");

    let count = 10_000;
    let standard: Vec<bool> = (0..count).map(|i| i % 3 == 0).collect();
    let mut packed = BoolVector::new();
    packed.reserve_exact(count)?;
    for &b in &standard {
        packed.push(b)?;
    }

    let standard_bytes = standard.capacity() * std::mem::size_of::<bool>();
    let packed_bytes = packed.byte_capacity();

    println!("  Vec<bool>:   {} bytes", standard_bytes);
    println!("  BoolVector:  {} bytes", packed_bytes);
    println!(
        "  Savings:     {:.2}%",
        100.0 * (1.0 - packed_bytes as f64 / standard_bytes as f64)
    );

    Ok(())
}
