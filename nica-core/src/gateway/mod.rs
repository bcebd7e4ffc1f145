//! The generic command/data/done register-RPC protocol that every control
//! surface in `spec.md` §4.10 is wrapped in: the flow table, the arbiter,
//! the custom-ring table, the scheduler, and every ikernel's context
//! arrays.
//!
//! Grounded on the same shape the teacher uses for its own control-plane
//! RPC (`proxy::handler` routing a request to a stateful target) but
//! collapsed to the hardware's exact three-register contract per
//! `spec.md` §9 ("Gateway RPC as state machine ... `rpc(addr, value) ->
//! Future<Result>`, resolved when the target component next drains its
//! command queue"). Software has no bus latency to hide, so `Gateway`
//! keeps a one-deep command slot rather than a real register file, and
//! `drain_one` is the one point per tick where a pending command is
//! allowed to apply.

pub mod addr;

/// Status every gateway command resolves to (`spec.md` §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Done,
    Busy,
    Fail,
}

/// A decoded `{addr, write, data}` command, pending `go=1` until a target
/// drains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayCommand {
    pub addr: u32,
    pub write: bool,
    pub data: u32,
}

/// Anything addressable through the gateway: the flow table, the arbiter,
/// the scheduler, a ring table, or an ikernel's register map.
pub trait GatewayTarget {
    fn gateway_write(&mut self, addr: u32, data: u32) -> GatewayStatus;
    fn gateway_read(&mut self, addr: u32) -> (GatewayStatus, u32);
}

/// The cmd/data/done register trio, modelled as a single pending command
/// slot. `submit` is the caller raising `go=1`; `drain_one` is the target
/// component's one-command-per-tick service point (`spec.md` §4.10: "the
/// target component drains at most one gateway command per tick, so
/// lookups and updates to the same table never alias within the same
/// tick"); `poll` is the caller checking `done`.
#[derive(Default)]
pub struct Gateway {
    pending: Option<GatewayCommand>,
    result: Option<(GatewayStatus, u32)>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise `go=1`. Returns `false` (caller must retry — `GW_BUSY`) if a
    /// command is already in flight.
    pub fn submit(&mut self, cmd: GatewayCommand) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(cmd);
        self.result = None;
        true
    }

    /// Drain at most one pending command against `target`. A no-op if
    /// nothing is pending.
    pub fn drain_one(&mut self, target: &mut impl GatewayTarget) {
        let Some(cmd) = self.pending.take() else { return };
        let result = if cmd.write {
            (target.gateway_write(cmd.addr, cmd.data), cmd.data)
        } else {
            target.gateway_read(cmd.addr)
        };
        self.result = Some(result);
    }

    /// Poll `done`. `None` means the command is still in flight (`GW_BUSY`
    /// from the caller's perspective, modelled here as "not yet").
    pub fn poll(&mut self) -> Option<(GatewayStatus, u32)> {
        self.result.take()
    }

    /// Convenience: submit, drain immediately (as `drain_one` would on the
    /// component's next tick), and return the result. Used by tests and by
    /// callers that don't need the busy/retry protocol.
    pub fn call(&mut self, target: &mut impl GatewayTarget, cmd: GatewayCommand) -> (GatewayStatus, u32) {
        assert!(self.submit(cmd), "gateway busy: a prior command was never drained");
        self.drain_one(target);
        self.poll().expect("drain_one always resolves the command it drains")
    }
}

/// Any addressable surface behind a [`VirtGateway`]: an array of
/// per-ikernel contexts, fanned out by a fourth `ikernel_id` register
/// (`spec.md` §4.10, §6 "ikernel-virt-gateway").
pub trait VirtGatewayTarget {
    fn virt_gateway_write(&mut self, ikernel_id: u8, addr: u32, data: u32) -> GatewayStatus;
    fn virt_gateway_read(&mut self, ikernel_id: u8, addr: u32) -> (GatewayStatus, u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtGatewayCommand {
    pub ikernel_id: u8,
    pub addr: u32,
    pub write: bool,
    pub data: u32,
}

/// Wraps [`Gateway`]'s three registers with the fourth `ikernel_id`
/// register so one control channel fans out across an ikernel's
/// per-context arrays, replacing the CRTP `virt_gateway_impl<Ikernel>`
/// mixin (`spec.md` §9) with plain composition.
#[derive(Default)]
pub struct VirtGateway {
    pending: Option<VirtGatewayCommand>,
    result: Option<(GatewayStatus, u32)>,
}

impl VirtGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, cmd: VirtGatewayCommand) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(cmd);
        self.result = None;
        true
    }

    pub fn drain_one(&mut self, target: &mut impl VirtGatewayTarget) {
        let Some(cmd) = self.pending.take() else { return };
        let result = if cmd.write {
            (target.virt_gateway_write(cmd.ikernel_id, cmd.addr, cmd.data), cmd.data)
        } else {
            target.virt_gateway_read(cmd.ikernel_id, cmd.addr)
        };
        self.result = Some(result);
    }

    pub fn poll(&mut self) -> Option<(GatewayStatus, u32)> {
        self.result.take()
    }

    pub fn call(&mut self, target: &mut impl VirtGatewayTarget, cmd: VirtGatewayCommand) -> (GatewayStatus, u32) {
        assert!(self.submit(cmd), "virt-gateway busy: a prior command was never drained");
        self.drain_one(target);
        self.poll().expect("drain_one always resolves the command it drains")
    }
}
