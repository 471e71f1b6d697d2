mod common;

use a429::core::{
    A429Mode, ChannelMode, ChannelSelector, JobCode, Label, Parity, RxChannel, SdiMode, Speed,
    TxChannel,
};
use a429::debug::{Discretes, RwError};
use a429::driver::{opcode, Discrete};
use a429::CommandError;
use common::Bench;

const TX1: ChannelSelector = ChannelSelector::Tx(TxChannel::TX1);
const RX1: ChannelSelector = ChannelSelector::Rx(RxChannel::RX1);

fn receive_label_0x13(bench: &mut Bench) {
    bench.bridge.set_channel_mode(RX1, ChannelMode::Active).unwrap();
    assert!(bench
        .bridge
        .set_rx_filter(RX1, Label::new(0x13), SdiMode::Data)
        .unwrap());
}

#[test]
fn test_power_on_applies_every_setting() {
    let mut bench = Bench::new();
    assert_eq!(bench.chip.resets, 1);
    assert!(!bench.bridge.system().reset_chip);
    assert!(!bench.bridge.system().reset_data);

    // Passive transmitter: high impedance, automatic parity, high speed
    bench.bridge.restart();
    bench.tick(1);
    assert_eq!(bench.chip.last_write(opcode::WRITE_TX_CONTROL), Some(&[0xe4][..]));
    for channel in RxChannel::all() {
        let opcodes = opcode::rx(channel);
        assert_eq!(bench.chip.last_write(opcodes.write_control), Some(&[0x8c][..]));
        assert_eq!(bench.chip.write_count(opcodes.write_label_filter), 1);
    }
}

#[test]
fn test_control_words() {
    let mut bench = Bench::new();
    bench
        .bridge
        .set_channel_configuration(RX1, Parity::Data, Speed::Low);
    bench
        .bridge
        .set_channel_configuration(TX1, Parity::Data, Speed::Low);
    bench.bridge.set_channel_mode(TX1, ChannelMode::Active).unwrap();
    bench.tick(1);

    assert_eq!(
        bench.chip.last_write(opcode::rx(RxChannel::RX1).write_control),
        Some(&[0x85][..])
    );
    assert_eq!(bench.chip.last_write(opcode::WRITE_TX_CONTROL), Some(&[0x61][..]));
    // RX2 is untouched
    assert_eq!(
        bench.chip.write_count(opcode::rx(RxChannel::RX2).write_control),
        0
    );
}

#[test]
fn test_failed_config_write_is_retried() {
    let mut bench = Bench::new();
    receive_label_0x13(&mut bench);
    bench
        .bridge
        .set_channel_configuration(RX1, Parity::Data, Speed::Low);
    bench.chip.push_rx(RxChannel::RX1, 0x13);
    bench.chip.fail_writes = true;
    bench.run(1, 5);

    // Frames stay in the chip while the settings are stale
    assert!(bench.bridge.rx(RxChannel::RX1).common.pending());
    assert_eq!(bench.chip.rx_fifo[0].len(), 1);

    bench.chip.fail_writes = false;
    bench.tick(6);
    assert!(!bench.bridge.rx(RxChannel::RX1).common.pending());
    assert_eq!(
        bench.chip.last_write(opcode::rx(RxChannel::RX1).write_control),
        Some(&[0x85][..])
    );
    // Received under the old settings, the frame is flushed
    assert!(bench.chip.rx_fifo[0].is_empty());
    assert_eq!(bench.bridge.rx(RxChannel::RX1).common.stats.processed, 0);
}

#[test]
fn test_restart_resets_tables() {
    let mut bench = Bench::new();
    receive_label_0x13(&mut bench);
    bench
        .bridge
        .set_schedule_entry(TX1, 0, JobCode::Cyclic, 0, 10)
        .unwrap();
    bench.bridge.write_frame_direct(TX1, 7).unwrap();
    bench.tick(1);

    bench.bridge.restart();
    bench.tick(2);
    assert_eq!(bench.chip.resets, 2);
    let capabilities = bench.bridge.capabilities();
    assert_eq!(capabilities.tx_jobs_used, 0);
    assert_eq!(capabilities.rx_buffers_used, [0, 0]);
    assert_eq!(bench.bridge.channel_mode(RX1), Ok(ChannelMode::Passive));
    assert!(bench.bridge.tx(TxChannel::TX1).queue.is_empty());
}

#[test]
fn test_chip_reset_failure_is_retried() {
    let mut bench = Bench::new();
    bench.bridge.restart();
    bench.chip.fail_writes = true;
    bench.run(1, 3);
    assert!(bench.bridge.system().reset_chip);
    assert!(!bench.bridge.system().reset_data);
    assert_eq!(bench.chip.resets, 1);

    bench.chip.fail_writes = false;
    bench.tick(4);
    assert!(!bench.bridge.system().reset_chip);
    assert_eq!(bench.chip.resets, 2);
    assert_eq!(bench.chip.write_count(opcode::WRITE_TX_CONTROL), 1);
}

#[test]
fn test_debug_commands_in_normal_mode() {
    let mut bench = Bench::new();
    let bridge = &bench.bridge;
    assert_eq!(bridge.a429_mode(), A429Mode::Normal);
    assert_eq!(bridge.debug_discretes(&mut bench.chip), Discretes::default());
    assert_eq!(
        bridge
            .debug_read_register(&mut bench.chip, opcode::READ_TX_CONTROL)
            .unwrap()
            .len(),
        1
    );
    bridge
        .debug_write_register(&mut bench.chip, opcode::WRITE_TX_CONTROL, &[0x12])
        .unwrap();
    assert_eq!(bench.chip.last_write(opcode::WRITE_TX_CONTROL), Some(&[0x12][..]));
    assert_eq!(bench.bridge.a429_mode(), A429Mode::Normal);
}

#[test]
fn test_debug_mode_halts_processing() {
    let mut bench = Bench::new();
    receive_label_0x13(&mut bench);
    bench.tick(1);
    bench.bridge.set_a429_mode(A429Mode::Debug);
    bench.chip.push_rx(RxChannel::RX1, 0x0000_0513);
    bench.run(2, 10);
    assert_eq!(bench.chip.rx_fifo[0].len(), 1);

    let data = bench
        .bridge
        .debug_read_register(&mut bench.chip, opcode::rx(RxChannel::RX1).read_fifo)
        .unwrap();
    assert_eq!(data[..], [0x00, 0x00, 0x05, 0x13]);

    bench
        .bridge
        .debug_write_register(&mut bench.chip, opcode::WRITE_TX_CONTROL, &[0x12])
        .unwrap();
    assert_eq!(bench.chip.last_write(opcode::WRITE_TX_CONTROL), Some(&[0x12][..]));

    // Back to normal operation, every channel setting is written again
    bench.bridge.set_a429_mode(A429Mode::Normal);
    bench.tick(11);
    assert_eq!(bench.chip.last_write(opcode::WRITE_TX_CONTROL), Some(&[0xe4][..]));
    assert_eq!(
        bench.chip.last_write(opcode::rx(RxChannel::RX2).write_control),
        Some(&[0x8c][..])
    );
}

#[test]
fn test_debug_register_validation() {
    let mut bench = Bench::new();
    bench.bridge.set_a429_mode(A429Mode::Debug);
    let bridge = &bench.bridge;
    let chip = &mut bench.chip;

    assert_eq!(
        bridge.debug_read_register(chip, opcode::WRITE_TX_CONTROL),
        Err(CommandError::Debug(RwError::NoRead))
    );
    assert_eq!(
        bridge.debug_write_register(chip, opcode::READ_TX_STATUS, &[0]),
        Err(CommandError::Debug(RwError::NoWrite))
    );
    assert_eq!(
        bridge.debug_write_register(chip, opcode::WRITE_TX_CONTROL, &[0, 0]),
        Err(CommandError::Debug(RwError::InvalidLength))
    );
    assert_eq!(
        bridge.debug_read_register(chip, 0x00),
        Err(CommandError::Debug(RwError::InvalidOpCode))
    );
    assert!(chip.writes.is_empty());

    chip.fail_reads = true;
    assert_eq!(
        bridge.debug_read_register(chip, opcode::READ_TX_STATUS),
        Err(CommandError::Debug(RwError::Spi))
    );
    chip.fail_reads = false;
    let filter = bridge
        .debug_read_register(chip, opcode::rx(RxChannel::RX2).read_label_filter)
        .unwrap();
    assert_eq!(filter.len(), 32);
}

#[test]
fn test_debug_discretes() {
    let mut bench = Bench::new();
    bench.chip.levels[Discrete::TxFull.index()] = true;
    bench.chip.levels[Discrete::R1Int.index()] = true;
    let discretes = bench.bridge.debug_discretes(&mut bench.chip);
    assert_eq!(discretes.rx, 0x0001);
    assert_eq!(discretes.tx, 0b10);

    bench.chip.levels[Discrete::R1Int.index()] = false;
    bench.chip.levels[Discrete::Mb11.index()] = true;
    bench.chip.levels[Discrete::Mb21.index()] = true;
    bench.chip.push_rx(RxChannel::RX1, 0x13);
    bench.chip.push_rx(RxChannel::RX2, 0x13);
    let discretes = bench.bridge.debug_discretes(&mut bench.chip);
    // R1FLAG, MB11, R2FLAG, MB21
    assert_eq!(discretes.rx, 1 << 1 | 1 << 4 | 1 << 6 | 1 << 9);
}

#[test]
fn test_fifo_drain_follows_filter_write() {
    let mut bench = Bench::new();
    receive_label_0x13(&mut bench);
    bench.tick(1);
    bench.chip.transfers.clear();

    bench
        .bridge
        .set_channel_configuration(RX1, Parity::Data, Speed::Low);
    assert!(bench
        .bridge
        .set_rx_filter(RX1, Label::new(0x14), SdiMode::Data)
        .unwrap());
    bench.chip.push_rx(RxChannel::RX1, 0x13);
    bench.chip.push_rx(RxChannel::RX1, 0x14);
    bench.tick(2);

    let opcodes = opcode::rx(RxChannel::RX1);
    assert_eq!(
        bench.chip.transfers,
        [
            opcodes.write_control,
            opcodes.write_label_filter,
            opcodes.read_fifo,
            opcodes.read_fifo
        ]
    );
    assert!(bench.chip.rx_fifo[0].is_empty());
    assert_eq!(bench.bridge.rx(RxChannel::RX1).common.stats.processed, 0);
}
