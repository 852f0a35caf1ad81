//! Save states, introspection and whole-core properties.

mod common;

use common::{boot, steps};
use emu_core::{Observable, Value};
use motorola_dsp56156::registers::ACC_MASK;
use motorola_dsp56156::{Dsp56156, DspState, Register, Source};
use proptest::prelude::*;

const INC_A: u16 = 0x4A22;

#[test]
fn snapshot_resumes_bit_for_bit() {
    // DO #4,$0004 / INC A / MOVE A,X:(R0)+ / NOP
    let program = [0x0E04, 0x0004, INC_A, 0x8811, 0x0000];
    let (mut dsp, mut mem) = boot(&program);
    dsp.set_ipr(0b101);
    dsp.raise_interrupt(Source::HostCommand);
    steps(&mut dsp, &mut mem, 3);

    let bytes = dsp.snapshot().to_bytes().unwrap();
    let state = DspState::from_bytes(&bytes).unwrap();
    assert_eq!(state, dsp.snapshot());

    let mut copy = Dsp56156::new();
    copy.restore(&state);
    let mut copy_mem = mem.clone();
    assert_eq!(copy.snapshot(), dsp.snapshot());

    steps(&mut dsp, &mut mem, 5);
    steps(&mut copy, &mut copy_mem, 5);
    assert_eq!(copy.snapshot(), dsp.snapshot());
    assert_eq!(copy_mem, mem);
}

#[test]
fn snapshot_keeps_interrupt_service_cycles() {
    // SWI, serviced at the end of its own step.
    let (mut dsp, mut mem) = boot(&[0x0005, INC_A, INC_A]);
    assert_eq!(dsp.step(&mut mem).get(), 6);
    let state = dsp.snapshot();
    assert_eq!(state.interrupt_cycles, 2);

    let mut copy = Dsp56156::new();
    copy.restore(&DspState::from_bytes(&state.to_bytes().unwrap()).unwrap());
    assert_eq!(copy.snapshot(), state);
}

#[test]
fn state_serializes_with_named_fields() {
    let (mut dsp, _mem) = boot(&[]);
    dsp.regs.a = 0xFF_8000_0000;
    dsp.raise_interrupt(Source::SoftwareInterrupt);
    let json = serde_json::to_value(dsp.snapshot()).unwrap();
    assert_eq!(json["registers"]["a"], serde_json::json!(0xFF_8000_0000_u64));
    assert_eq!(json["registers"]["m"], serde_json::json!([0xFFFF, 0xFFFF, 0xFFFF, 0xFFFF]));
    assert_eq!(json["registers"]["sr"], serde_json::json!(0x0300));
    assert_eq!(json["pending"], serde_json::json!(["SoftwareInterrupt"]));
    assert_eq!(json["fast_interrupt"], serde_json::Value::Null);
    assert_eq!(json["power"], serde_json::json!("Running"));
}

#[test]
fn observable_registers_and_flags() {
    let (mut dsp, mut mem) = boot(&[0x4A01]);
    dsp.regs.a = 0x12_3456_789A;
    assert_eq!(dsp.query("a"), Some(Value::U40(0x12_3456_789A)));
    assert_eq!(dsp.query("a1"), Some(Value::U16(0x3456)));
    assert_eq!(dsp.query("a2"), Some(Value::U8(0x12)));
    assert_eq!(dsp.query("int_mask"), Some(Value::U8(3)));
    assert_eq!(dsp.query("sr.z"), Some(Value::Bool(false)));

    dsp.step(&mut mem);
    assert_eq!(dsp.query("sr.z"), Some(Value::Bool(true)));
    assert_eq!(dsp.query("ppc"), Some(Value::U16(0)));
    assert_eq!(dsp.query("cycles"), Some(Value::U64(4)));
    assert_eq!(dsp.query("nonsense"), None);
}

#[test]
fn observable_poke() {
    let mut dsp = Dsp56156::new();
    assert!(dsp.poke("b1", Value::U16(0x1234)));
    assert_eq!(dsp.register(Register::B), 0x00_1234_0000);
    assert!(dsp.poke("sr.c", Value::Bool(true)));
    assert_eq!(dsp.regs.sr & 1, 1);
    assert!(dsp.poke("ss[2].h", Value::U16(0xBEEF)));
    assert_eq!(dsp.stack_pair(2).high, 0xBEEF);
    assert_eq!(dsp.query("ss[2].h"), Some(Value::U16(0xBEEF)));
    assert!(!dsp.poke("ss[16].h", Value::U16(1)));
    assert!(!dsp.poke("r0", Value::String("x".into())));
    assert!(dsp.query_paths().contains(&"rep_addr"));
}

#[test]
fn pending_interrupts_by_name() {
    let mut dsp = Dsp56156::new();
    dsp.raise_interrupt(Source::HostCommand);
    assert_eq!(
        dsp.query("pending"),
        Some(Value::Array(vec![Value::String("Host Command".into())]))
    );
}

proptest! {
    #[test]
    fn accumulators_stay_canonical(
        ops in proptest::collection::vec(0x00u16..=0xFF, 1..16),
        a in 0u64..=ACC_MASK,
        b in 0u64..=ACC_MASK,
        x in any::<u32>(),
        y in any::<u32>(),
    ) {
        let program: Vec<u16> = ops.iter().map(|&alu| 0x4A00 | alu).collect();
        let (mut dsp, mut mem) = boot(&program);
        dsp.set_register(Register::A, a);
        dsp.set_register(Register::B, b);
        dsp.regs.x = x;
        dsp.regs.y = y;
        for _ in 0..program.len() {
            dsp.step(&mut mem);
            prop_assert_eq!(dsp.regs.a as u64 & !ACC_MASK, 0);
            prop_assert!(dsp.regs.a >= 0);
            prop_assert!(dsp.regs.b >= 0);
            prop_assert_eq!(dsp.regs.b as u64 & !ACC_MASK, 0);
        }
        prop_assert_eq!(dsp.regs.pc as usize, program.len());
    }

    #[test]
    fn snapshot_round_trips_after_interrupt_service(
        before in 0usize..4,
        after in 1usize..6,
        a in 0u64..=ACC_MASK,
        budget in 1u32..40,
    ) {
        // NOPs, then INC A in a loop, with SWI raised part way through.
        let mut program = vec![0x0000; before];
        program.extend_from_slice(&[INC_A, 0x0124]);
        let (mut dsp, mut mem) = boot(&program);
        dsp.set_register(Register::A, a);
        dsp.set_register(Register::R0, before as u64);
        dsp.run(&mut mem, budget);
        dsp.raise_interrupt(Source::SoftwareInterrupt);
        dsp.step(&mut mem);
        prop_assert_eq!(dsp.snapshot().interrupt_cycles, 2);

        let state = DspState::from_bytes(&dsp.snapshot().to_bytes().unwrap()).unwrap();
        let mut copy = Dsp56156::new();
        copy.restore(&state);
        let mut copy_mem = mem.clone();
        prop_assert_eq!(copy.snapshot(), dsp.snapshot());

        steps(&mut dsp, &mut mem, after);
        steps(&mut copy, &mut copy_mem, after);
        prop_assert_eq!(copy.snapshot(), dsp.snapshot());
    }

    #[test]
    fn mac_adds_doubled_product(a in 0u64..=ACC_MASK, s1 in any::<u16>(), s2 in any::<u16>()) {
        // MAC +Y0,X0,A
        let (mut dsp, mut mem) = boot(&[0x4AA4]);
        dsp.set_register(Register::A, a);
        dsp.set_register(Register::Y0, s1.into());
        dsp.set_register(Register::X0, s2.into());
        dsp.step(&mut mem);
        let term = (i64::from(s1 as i16) * i64::from(s2 as i16)) << 1;
        let expected = (a as i64).wrapping_add(term) as u64 & ACC_MASK;
        prop_assert_eq!(dsp.register(Register::A), expected);
    }
}
