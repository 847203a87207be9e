//! Composed, unsigned transaction descriptions.
//!
//! A [`ProgrammableTransaction`] is an ordered list of commands over a shared
//! input table. Commands refer to inputs and to earlier commands' results
//! through [`Argument`]s, so a coin split and the call consuming the split
//! coin travel in one transaction and commit together.
//!
//! Pure inputs carry their canonical binary encoding (ULEB128 length
//! prefixes, little-endian integers, 32-byte addresses), serialised as base64
//! alongside a readable value.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::address::Address;
use crate::registry::ContractFunction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PureArg {
    Address(Address),
    String(String),
    U64(u64),
    Bool(bool),
    AddressVec(Vec<Address>),
}

impl PureArg {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Address(_) => "address",
            Self::String(_) => "string",
            Self::U64(_) => "u64",
            Self::Bool(_) => "bool",
            Self::AddressVec(_) => "vector<address>",
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Self::Address(a) => out.extend_from_slice(a.as_bytes()),
            Self::String(s) => {
                write_uleb128(&mut out, s.len() as u64);
                out.extend_from_slice(s.as_bytes());
            }
            Self::U64(n) => out.extend_from_slice(&n.to_le_bytes()),
            Self::Bool(b) => out.push(u8::from(*b)),
            Self::AddressVec(v) => {
                write_uleb128(&mut out, v.len() as u64);
                for a in v {
                    out.extend_from_slice(a.as_bytes());
                }
            }
        }
        out
    }
}

fn write_uleb128(out: &mut Vec<u8>, mut n: u64) {
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        if n == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

impl Serialize for PureArg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("PureArg", 3)?;
        st.serialize_field("type", self.type_tag())?;
        match self {
            Self::Address(a) => st.serialize_field("value", a)?,
            Self::String(s) => st.serialize_field("value", s)?,
            // u64 exceeds JSON's safe integer range.
            Self::U64(n) => st.serialize_field("value", &n.to_string())?,
            Self::Bool(b) => st.serialize_field("value", b)?,
            Self::AddressVec(v) => st.serialize_field("value", v)?,
        }
        st.serialize_field("bytes", &STANDARD.encode(self.to_bytes()))?;
        st.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CallArg {
    Pure(PureArg),
    Object(Address),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Argument {
    /// The coin paying for gas.
    GasCoin,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveCall {
    pub package: Address,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Command {
    SplitCoins { coin: Argument, amounts: Vec<Argument> },
    MoveCall(MoveCall),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgrammableTransaction {
    pub inputs: Vec<CallArg>,
    pub commands: Vec<Command>,
}

impl ProgrammableTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pure(&mut self, arg: PureArg) -> Argument {
        self.push_input(CallArg::Pure(arg))
    }

    /// Object inputs are shared: referencing the same id twice reuses the input.
    pub fn object(&mut self, id: Address) -> Argument {
        let existing = self
            .inputs
            .iter()
            .position(|i| matches!(i, CallArg::Object(o) if *o == id));
        match existing {
            Some(idx) => Argument::Input(idx as u16),
            None => self.push_input(CallArg::Object(id)),
        }
    }

    /// Split `amounts` off the gas coin; one result per amount.
    pub fn split_gas(&mut self, amounts: &[u64]) -> Vec<Argument> {
        let amount_args = amounts.iter().map(|a| self.pure(PureArg::U64(*a))).collect();
        let cmd = self.push_command(Command::SplitCoins {
            coin: Argument::GasCoin,
            amounts: amount_args,
        });
        (0..amounts.len())
            .map(|i| Argument::NestedResult(cmd, i as u16))
            .collect()
    }

    pub fn move_call(
        &mut self,
        package: Address,
        function: ContractFunction,
        arguments: Vec<Argument>,
    ) -> Argument {
        let cmd = self.push_command(Command::MoveCall(MoveCall {
            package,
            module: function.module().to_string(),
            function: function.function().to_string(),
            type_arguments: function.type_arguments(),
            arguments,
        }));
        Argument::Result(cmd)
    }

    /// The input an argument refers to, if it refers to one.
    pub fn input(&self, arg: Argument) -> Option<&CallArg> {
        match arg {
            Argument::Input(i) => self.inputs.get(i as usize),
            _ => None,
        }
    }

    pub fn move_calls(&self) -> impl Iterator<Item = &MoveCall> {
        self.commands.iter().filter_map(|c| match c {
            Command::MoveCall(call) => Some(call),
            Command::SplitCoins { .. } => None,
        })
    }

    fn push_input(&mut self, arg: CallArg) -> Argument {
        self.inputs.push(arg);
        Argument::Input((self.inputs.len() - 1) as u16)
    }

    fn push_command(&mut self, cmd: Command) -> u16 {
        self.commands.push(cmd);
        (self.commands.len() - 1) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pure_encodings() {
        assert_eq!(PureArg::U64(1).to_bytes(), vec![1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(PureArg::Bool(true).to_bytes(), vec![1]);
        assert_eq!(PureArg::String("hi".into()).to_bytes(), vec![2, b'h', b'i']);
        assert_eq!(PureArg::Address(Address::parse("0x6").unwrap()).to_bytes().len(), 32);

        let v = PureArg::AddressVec(vec![
            Address::parse("0x1").unwrap(),
            Address::parse("0x2").unwrap(),
        ]);
        let bytes = v.to_bytes();
        assert_eq!(bytes.len(), 1 + 64);
        assert_eq!(bytes[0], 2);
        assert_eq!(bytes[32], 1);
        assert_eq!(bytes[64], 2);
    }

    #[test]
    fn uleb128_multi_byte_lengths() {
        let s = "x".repeat(300);
        let bytes = PureArg::String(s).to_bytes();
        // 300 = 0b1_0010_1100 → [0xac, 0x02]
        assert_eq!(&bytes[..2], &[0xac, 0x02]);
        assert_eq!(bytes.len(), 302);
    }

    #[test]
    fn pure_json_shape() {
        let json = serde_json::to_value(PureArg::U64(500_000_000)).unwrap();
        assert_eq!(json["type"], "u64");
        assert_eq!(json["value"], "500000000");
        assert_eq!(json["bytes"], STANDARD.encode(500_000_000u64.to_le_bytes()));
    }

    #[test]
    fn object_inputs_are_deduplicated() {
        let mut tx = ProgrammableTransaction::new();
        let a = tx.object(Address::parse("0xb1").unwrap());
        let _ = tx.pure(PureArg::Bool(false));
        let b = tx.object(Address::parse("0xb1").unwrap());
        assert_eq!(a, b);
        assert_eq!(tx.inputs.len(), 2);
    }

    #[test]
    fn split_then_consume() {
        let mut tx = ProgrammableTransaction::new();
        let coins = tx.split_gas(&[7]);
        assert_eq!(coins, vec![Argument::NestedResult(0, 0)]);
        tx.move_call(Address::parse("0xa").unwrap(), ContractFunction::CreateBoard, coins);

        assert!(matches!(tx.commands[0], Command::SplitCoins { coin: Argument::GasCoin, .. }));
        let call = tx.move_calls().next().unwrap();
        assert_eq!(call.arguments, vec![Argument::NestedResult(0, 0)]);

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["commands"][0]["SplitCoins"]["coin"], json!("GasCoin"));
        assert_eq!(json["commands"][1]["MoveCall"]["function"], "create_board");
    }
}
