//! Wraps [`FlowTable`] behind the gateway's `{cmd, data, done}` protocol
//! (`spec.md` §6 flow-table ops: `FT_FIELDS`, `FT_ADD_FLOW`,
//! `FT_DELETE_FLOW`, `FT_SET_ENTRY`, `FT_READ_ENTRY`, key regs
//! `0x10-0x14` (the last being `vm_id`, `spec.md` §3's fifth key field),
//! result regs `0x18-0x1A`, valid-bit `0x20`).
//!
//! The hardware stages a key and a result into four-plus-three scratch
//! registers before raising the command register; this keeps the same
//! two-phase shape (stage fields, then fire an opcode) rather than
//! widening every op into a single wide register, mirroring how the
//! source's `flow_table_gateway` is itself layered over the raw table.
//!
//! Open question resolved here (`spec.md` §9 doesn't fix the exact index
//! encoding for `FT_SET_ENTRY`/`FT_READ_ENTRY`): the raw slot index for
//! those two debug ops is taken from the staged `FT_KEY_SADDR` register,
//! since bit-exact RTL addressing is explicitly out of scope (`spec.md`
//! §1 Non-goals).

use std::net::Ipv4Addr;

use crate::gateway::addr::flow_table::*;
use crate::gateway::{GatewayStatus, GatewayTarget};

use super::key::{FieldMask, FlowKey};
use super::table::{FlowAction, FlowTable, FlowValue};

#[derive(Default)]
struct StagedKey {
    src_ip: u32,
    dst_ip: u32,
    src_port: u32,
    dst_port: u32,
    vm_id: u32,
}

#[derive(Default)]
struct StagedResult {
    action: u32,
    engine_id: u32,
    ikernel_id: u32,
    valid: u32,
}

pub struct FlowTableGateway {
    pub table: FlowTable,
    pub fields: FieldMask,
    key: StagedKey,
    result: StagedResult,
    last_op_result: u32,
}

impl Default for FlowTableGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowTableGateway {
    pub fn new() -> Self {
        Self {
            table: FlowTable::new(),
            fields: FieldMask::default(),
            key: StagedKey::default(),
            result: StagedResult::default(),
            last_op_result: 0,
        }
    }

    fn staged_tuple(&self) -> crate::pipeline::metadata::FiveTuple {
        crate::pipeline::metadata::FiveTuple {
            src_ip: Ipv4Addr::from(self.key.src_ip),
            dst_ip: Ipv4Addr::from(self.key.dst_ip),
            src_port: self.key.src_port as u16,
            dst_port: self.key.dst_port as u16,
            vm_id: self.key.vm_id as u8,
        }
    }

    fn staged_key(&self) -> FlowKey {
        FlowKey::masked(self.staged_tuple(), self.fields)
    }

    fn staged_value(&self) -> FlowValue {
        let action = match self.result.action {
            0 => FlowAction::Passthrough,
            1 => FlowAction::Drop,
            _ => FlowAction::Ikernel,
        };
        FlowValue { action, engine_id: self.result.engine_id as u8, ikernel_id: self.result.ikernel_id as u8 }
    }
}

impl GatewayTarget for FlowTableGateway {
    fn gateway_write(&mut self, addr: u32, data: u32) -> GatewayStatus {
        match addr {
            FT_FIELDS => {
                self.fields = FieldMask::from_bits_truncate(data as u8);
                GatewayStatus::Done
            }
            FT_KEY_SADDR => {
                self.key.src_ip = data;
                GatewayStatus::Done
            }
            FT_KEY_DADDR => {
                self.key.dst_ip = data;
                GatewayStatus::Done
            }
            FT_KEY_SPORT => {
                self.key.src_port = data;
                GatewayStatus::Done
            }
            FT_KEY_DPORT => {
                self.key.dst_port = data;
                GatewayStatus::Done
            }
            FT_KEY_VMID => {
                self.key.vm_id = data;
                GatewayStatus::Done
            }
            FT_RESULT_ACTION => {
                self.result.action = data;
                GatewayStatus::Done
            }
            FT_RESULT_ENGINE => {
                self.result.engine_id = data;
                GatewayStatus::Done
            }
            FT_RESULT_IKERNEL_ID => {
                self.result.ikernel_id = data;
                GatewayStatus::Done
            }
            FT_VALID => {
                self.result.valid = data;
                GatewayStatus::Done
            }
            FT_ADD_FLOW => match self.table.add(self.staged_key(), self.staged_value()) {
                Some(flow_id) => {
                    self.last_op_result = flow_id as u32;
                    GatewayStatus::Done
                }
                None => {
                    self.last_op_result = 0;
                    GatewayStatus::Fail
                }
            },
            FT_DELETE_FLOW => {
                if self.table.delete(self.staged_key()) {
                    self.last_op_result = 1;
                    GatewayStatus::Done
                } else {
                    self.last_op_result = 0;
                    GatewayStatus::Fail
                }
            }
            FT_SET_ENTRY => {
                let index = self.key.src_ip as u16;
                if self.table.set_entry(index, self.staged_key(), self.staged_value()) {
                    GatewayStatus::Done
                } else {
                    GatewayStatus::Fail
                }
            }
            _ => GatewayStatus::Fail,
        }
    }

    fn gateway_read(&mut self, addr: u32) -> (GatewayStatus, u32) {
        match addr {
            FT_FIELDS => (GatewayStatus::Done, self.fields.bits() as u32),
            FT_ADD_FLOW | FT_DELETE_FLOW => (GatewayStatus::Done, self.last_op_result),
            FT_READ_ENTRY => {
                let index = self.key.src_ip as u16;
                match self.table.read_entry(index) {
                    Some((_, value)) => (GatewayStatus::Done, value.action as u32),
                    None => (GatewayStatus::Fail, 0),
                }
            }
            _ => (GatewayStatus::Fail, 0),
        }
    }
}
