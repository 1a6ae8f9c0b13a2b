//! Interrupt Service Expansion.
//!
//! Under the vectored interrupt model a `SYSCALL,d` or `END_IO,d` is not a single
//! burst: it is a full trip through the kernel. [`service_routine`] produces the
//! ordered steps of that trip for device `d`:
//! 1. **Entry:** switch to kernel mode, save the context, find the vector at memory
//!    position `d * 2`, load the ISR address into the PC.
//! 2. **Body:** the device-specific ISR activities, stretched to the device's delay.
//! 3. **Exit:** IRET, restore the context, switch back to user mode.
//!
//! The scheduler charges every step to the acting process and logs one entry per step.

use crate::common::constants::VECTOR_ENTRY_SIZE;
use crate::common::error::ReferenceError;
use crate::config::InterruptConfig;
use crate::devices::DeviceTables;

/// Which interrupt is being serviced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptKind {
    /// A system call requesting I/O from the device.
    Syscall,
    /// The device signalling I/O completion.
    EndIo,
}

/// One timed step of an interrupt service sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IsrStep {
    /// Cycles the step takes.
    pub duration: u64,
    /// Log description of the step.
    pub description: String,
}

impl IsrStep {
    fn new(duration: u64, description: impl Into<String>) -> Self {
        Self {
            duration,
            description: description.into(),
        }
    }
}

/// Expands an interrupt on `device` into its timed service steps.
///
/// # Arguments
///
/// * `kind` - SYSCALL or END_IO.
/// * `device` - Device number (index into both tables).
/// * `tables` - The run's vector and device tables.
/// * `timing` - Per-step cycle costs.
///
/// # Returns
///
/// The steps in execution order, or `UnknownDevice` when either table lacks `device`.
pub fn service_routine(
    kind: InterruptKind,
    device: u64,
    tables: &DeviceTables,
    timing: &InterruptConfig,
) -> Result<Vec<IsrStep>, ReferenceError> {
    let unknown = || ReferenceError::UnknownDevice {
        device,
        available: tables.len(),
    };
    let vector = tables.vector(device).ok_or_else(unknown)?;
    let delay = tables.delay(device).ok_or_else(unknown)?;
    let position = device.saturating_mul(VECTOR_ENTRY_SIZE);

    let mut steps = vec![
        IsrStep::new(timing.switch_mode, "switch to kernel mode"),
        IsrStep::new(timing.context, "context saved"),
        IsrStep::new(
            timing.vector_lookup,
            format!("find vector {device} in memory position 0X{position:04X}"),
        ),
        IsrStep::new(
            timing.vector_lookup,
            format!("load address {vector} into the PC"),
        ),
    ];

    let body = match kind {
        InterruptKind::Syscall => {
            steps.push(IsrStep::new(
                timing.isr_activity,
                "SYSCALL: run the ISR (call device driver)",
            ));
            steps.push(IsrStep::new(
                timing.isr_activity,
                "transfer data from device to memory",
            ));
            ("check for errors", timing.isr_activity.saturating_mul(2))
        }
        InterruptKind::EndIo => {
            steps.push(IsrStep::new(
                timing.isr_activity,
                "ENDIO: run the ISR (device driver)",
            ));
            ("check device status", timing.isr_activity)
        }
    };

    let (remainder, spent) = body;
    if delay > spent {
        steps.push(IsrStep::new(delay - spent, remainder));
    }

    steps.push(IsrStep::new(timing.iret, "IRET"));
    steps.push(IsrStep::new(timing.context, "context restored"));
    steps.push(IsrStep::new(timing.switch_mode, "switch to user mode"));
    Ok(steps)
}

/// Total cycles of a service sequence.
pub fn total_cycles(steps: &[IsrStep]) -> u64 {
    steps.iter().map(|step| step.duration).sum()
}
