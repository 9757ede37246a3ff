#![no_main]

use bitserial_core::{BufferedConsole, CoreConfig, CoreState, MemoryImage, MemorySize};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let split = usize::from(data[0]).min(data.len() - 1);
    let (program, input) = data[1..].split_at(split);

    let words: Vec<u16> = program
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    let config = CoreConfig {
        memory_size: MemorySize::new(256).unwrap_or_default(),
        switches: 0,
    };
    let mut state = CoreState::from_image(&MemoryImage::new(words), &config);
    let mut console = BufferedConsole::with_input(input);
    let _ = state.run(&mut console, Some(4096));

    let image = MemoryImage::from_memory(&state.memory);
    let _ = MemoryImage::parse_hex(&image.to_hex(), config.memory_size);

    let source = String::from_utf8_lossy(data);
    let _ = bitserial_asm::assemble(&source);
});
