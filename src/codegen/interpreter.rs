//! Small Hack VM used to check the runtime behavior of generated code.
//!
//! Memory follows the standard Hack layout (`SP`, `LCL`, `ARG`, `THIS`, `THAT`
//! at addresses 0-4, `temp` at 5, stack from 256, heap from 2048). The few
//! OS routines the compiler depends on are built in.

use std::collections::HashMap;

use thiserror::Error;

use super::vm::{LabelAction, ParseInstructionError, Segment, VMCommand, VMInstruction};

const SP: usize = 0;
const LCL: usize = 1;
const ARG: usize = 2;
const THIS: usize = 3;
const THAT: usize = 4;
const POINTER_BASE: usize = THIS;
const TEMP_BASE: usize = 5;
const STACK_BASE: usize = 256;
const HEAP_BASE: usize = 2048;
const RAM_SIZE: usize = 32768;

const STEP_LIMIT: usize = 1_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Fault {
    #[error(transparent)]
    Parse(#[from] ParseInstructionError),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("unknown label `{label}` in `{function}`")]
    UnknownLabel { function: String, label: String },

    #[error("invalid address {0}")]
    InvalidAddress(i32),

    #[error("cannot pop into the constant segment")]
    PopConstant,

    #[error("division by zero")]
    DivisionByZero,

    #[error("out of heap memory")]
    OutOfMemory,

    #[error("program did not finish within {STEP_LIMIT} steps")]
    StepLimit,
}

type Result<T> = std::result::Result<T, Fault>;

/// Saved state of a caller.
#[derive(Debug)]
struct Frame {
    /// `None` for the entry point.
    return_address: Option<usize>,
    function: String,
    lcl: i16,
    arg: i16,
    this: i16,
    that: i16,
}

#[derive(Debug)]
pub struct Machine {
    ram: Vec<i16>,
    statics: HashMap<(String, usize), i16>,
    program: Vec<VMInstruction>,
    functions: HashMap<String, usize>,
    labels: HashMap<(String, String), usize>,
    frames: Vec<Frame>,
    function: String,
    pc: usize,
    heap_end: usize,
}

impl Machine {
    /// Load a program from VM text (any number of classes, one instruction per line).
    pub fn load(source: &str) -> Result<Self> {
        let program = source
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::parse)
            .collect::<std::result::Result<Vec<VMInstruction>, _>>()?;

        let mut functions = HashMap::new();
        let mut labels = HashMap::new();
        let mut function = String::new();

        for (address, instruction) in program.iter().enumerate() {
            match instruction {
                VMInstruction::Function(name, _) => {
                    function.clone_from(name);
                    functions.insert(name.clone(), address);
                }
                VMInstruction::Label(LabelAction::Label, label) => {
                    labels.insert((function.clone(), label.clone()), address);
                }
                _ => {}
            }
        }

        let mut ram = vec![0; RAM_SIZE];
        ram[SP] = to_word(STACK_BASE);

        Ok(Self {
            ram,
            statics: HashMap::new(),
            program,
            functions,
            labels,
            frames: Vec::new(),
            function: String::new(),
            pc: 0,
            heap_end: HEAP_BASE,
        })
    }

    /// Call the given argumentless function and run until it returns its value.
    pub fn run(&mut self, entry: &str) -> Result<i16> {
        self.enter(entry, 0, None)?;

        for _ in 0..STEP_LIMIT {
            if let Some(value) = self.step()? {
                return Ok(value);
            }
        }

        Err(Fault::StepLimit)
    }

    /// Read a string object created by `String.new`/`String.appendChar`.
    pub fn read_string(&self, address: i16) -> Result<String> {
        let base = to_address(address)?;
        let length = to_address(self.ram[base])?;

        Ok(self.ram[base + 1..=base + length]
            .iter()
            .filter_map(|&code| u32::try_from(code).ok().and_then(char::from_u32))
            .collect())
    }

    /// Execute a single instruction, returning the result of the entry
    /// function once it returns.
    fn step(&mut self) -> Result<Option<i16>> {
        let instruction = self
            .program
            .get(self.pc)
            .cloned()
            .ok_or_else(|| Fault::UnknownFunction(self.function.clone()))?;
        self.pc += 1;

        match instruction {
            VMInstruction::Push(segment, i) => {
                let value = self.read(segment, i)?;
                self.push(value);
            }
            VMInstruction::Pop(segment, i) => {
                let value = self.pop()?;
                self.write(segment, i, value)?;
            }
            VMInstruction::Command(VMCommand::Return) => return self.leave(),
            VMInstruction::Command(command) => self.arithmetic(command)?,
            VMInstruction::Label(LabelAction::Label, _) => {}
            VMInstruction::Label(LabelAction::Goto, label) => self.jump(&label)?,
            VMInstruction::Label(LabelAction::IfGoto, label) => {
                if self.pop()? != 0 {
                    self.jump(&label)?;
                }
            }
            VMInstruction::Function(_, locals) => {
                for _ in 0..locals {
                    self.push(0);
                }
            }
            VMInstruction::Call(name, argument_count) => {
                if !self.builtin(&name, argument_count)? {
                    self.enter(&name, argument_count, Some(self.pc))?;
                }
            }
        }

        Ok(None)
    }

    // region: calls

    fn enter(
        &mut self,
        name: &str,
        argument_count: usize,
        return_address: Option<usize>,
    ) -> Result<()> {
        let address = *self
            .functions
            .get(name)
            .ok_or_else(|| Fault::UnknownFunction(name.to_owned()))?;

        self.frames.push(Frame {
            return_address,
            function: std::mem::replace(&mut self.function, name.to_owned()),
            lcl: self.ram[LCL],
            arg: self.ram[ARG],
            this: self.ram[THIS],
            that: self.ram[THAT],
        });

        let sp = self.ram[SP];
        self.ram[ARG] = sp - to_word(argument_count);
        self.ram[LCL] = sp;
        self.pc = address;

        Ok(())
    }

    fn leave(&mut self) -> Result<Option<i16>> {
        let value = self.pop()?;
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| Fault::UnknownFunction(self.function.clone()))?;

        let arg = to_address(self.ram[ARG])?;
        self.ram[arg] = value;
        self.ram[SP] = to_word(arg + 1);

        self.ram[LCL] = frame.lcl;
        self.ram[ARG] = frame.arg;
        self.ram[THIS] = frame.this;
        self.ram[THAT] = frame.that;
        self.function = frame.function;

        match frame.return_address {
            Some(address) => {
                self.pc = address;
                Ok(None)
            }
            None => Ok(Some(value)),
        }
    }

    /// Run a built-in OS routine, returning `false` if `name` is not one.
    fn builtin(&mut self, name: &str, argument_count: usize) -> Result<bool> {
        let mut arguments = vec![0; argument_count];
        let stack_top = to_address(self.ram[SP])?;
        let first = stack_top
            .checked_sub(argument_count)
            .ok_or(Fault::InvalidAddress(-1))?;
        arguments.copy_from_slice(&self.ram[first..stack_top]);

        let result = match (name, arguments.as_slice()) {
            ("Memory.alloc" | "Array.new", &[size]) => self.allocate(size)?,
            ("Math.multiply", &[a, b]) => a.wrapping_mul(b),
            ("Math.divide", &[a, b]) => a.checked_div(b).ok_or(Fault::DivisionByZero)?,
            ("String.new", &[capacity]) => {
                let address = self.allocate(capacity.saturating_add(1))?;
                self.ram[to_address(address)?] = 0;
                address
            }
            ("String.appendChar", &[string, c]) => {
                let base = to_address(string)?;
                let length = to_address(self.ram[base])?;
                self.ram[base + length + 1] = c;
                self.ram[base] += 1;
                string
            }
            _ => return Ok(false),
        };

        self.ram[SP] = to_word(first);
        self.push(result);

        Ok(true)
    }

    fn allocate(&mut self, size: i16) -> Result<i16> {
        let address = self.heap_end;
        self.heap_end += to_address(size)?;

        if self.heap_end >= RAM_SIZE {
            return Err(Fault::OutOfMemory);
        }

        Ok(to_word(address))
    }

    fn jump(&mut self, label: &str) -> Result<()> {
        let key = (self.function.clone(), label.to_owned());

        self.pc = *self.labels.get(&key).ok_or_else(|| Fault::UnknownLabel {
            function: key.0.clone(),
            label: key.1.clone(),
        })?;

        Ok(())
    }

    // endregion

    // region: memory

    fn arithmetic(&mut self, command: VMCommand) -> Result<()> {
        let result = match command {
            VMCommand::Neg => self.pop()?.wrapping_neg(),
            VMCommand::Not => !self.pop()?,
            _ => {
                let b = self.pop()?;
                let a = self.pop()?;

                match command {
                    VMCommand::Add => a.wrapping_add(b),
                    VMCommand::Sub => a.wrapping_sub(b),
                    VMCommand::And => a & b,
                    VMCommand::Or => a | b,
                    VMCommand::Eq => truth(a == b),
                    VMCommand::Gt => truth(a > b),
                    VMCommand::Lt => truth(a < b),
                    VMCommand::Neg | VMCommand::Not | VMCommand::Return => unreachable!(),
                }
            }
        };

        self.push(result);

        Ok(())
    }

    fn push(&mut self, value: i16) {
        let sp = self.ram[SP];
        self.ram[usize::from(sp.unsigned_abs())] = value;
        self.ram[SP] = sp + 1;
    }

    fn pop(&mut self) -> Result<i16> {
        let sp = to_address(self.ram[SP] - 1)?;
        self.ram[SP] = to_word(sp);

        Ok(self.ram[sp])
    }

    fn address(&self, segment: Segment, i: usize) -> Result<usize> {
        let base = |register: usize| to_address(self.ram[register]);

        Ok(match segment {
            Segment::Local => base(LCL)? + i,
            Segment::Argument => base(ARG)? + i,
            Segment::This => base(THIS)? + i,
            Segment::That => base(THAT)? + i,
            Segment::Pointer => POINTER_BASE + i,
            Segment::Temp => TEMP_BASE + i,
            Segment::Static | Segment::Constant => unreachable!(),
        })
    }

    fn read(&self, segment: Segment, i: usize) -> Result<i16> {
        match segment {
            Segment::Constant => Ok(to_word(i)),
            Segment::Static => Ok(self
                .statics
                .get(&(self.class().to_owned(), i))
                .copied()
                .unwrap_or_default()),
            _ => Ok(self.ram[self.address(segment, i)?]),
        }
    }

    fn write(&mut self, segment: Segment, i: usize, value: i16) -> Result<()> {
        match segment {
            Segment::Constant => return Err(Fault::PopConstant),
            Segment::Static => {
                self.statics.insert((self.class().to_owned(), i), value);
            }
            _ => {
                let address = self.address(segment, i)?;
                self.ram[address] = value;
            }
        }

        Ok(())
    }

    /// Statics belong to the class of the running function.
    fn class(&self) -> &str {
        self.function
            .split_once('.')
            .map_or(self.function.as_str(), |(class, _)| class)
    }

    // endregion
}

const fn truth(condition: bool) -> i16 {
    if condition {
        -1
    } else {
        0
    }
}

fn to_address(word: i16) -> Result<usize> {
    usize::try_from(word)
        .ok()
        .filter(|&address| address < RAM_SIZE)
        .ok_or(Fault::InvalidAddress(word.into()))
}

fn to_word(value: usize) -> i16 {
    i16::try_from(value).unwrap_or(i16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::test_utils::compile;

    /// Compile every class and run `Main.main`.
    fn run(classes: &[&str]) -> Result<i16> {
        let mut machine = load(classes);
        machine.run("Main.main")
    }

    fn load(classes: &[&str]) -> Machine {
        let source = classes
            .iter()
            .flat_map(|class| compile(class).expect("test class should compile"))
            .collect::<Vec<_>>()
            .join("\n");

        Machine::load(&source).expect("generated code should be valid VM text")
    }

    #[test]
    fn test_left_to_right_evaluation() {
        let main = "class Main { function int main() { return 2 + 3 * 4; } }";

        assert_eq!(run(&[main]), Ok(20));
    }

    #[test]
    fn test_unary_and_comparison() {
        let main = "class Main {
            function int main() {
                if (~(1 = 2) & (-3 < 0)) { return -7; }
                return 0;
            }
        }";

        assert_eq!(run(&[main]), Ok(-7));
    }

    #[test]
    fn test_array_assignment_reading_other_elements() {
        let main = "class Main {
            function int main() {
                var Array a, b;
                let a = Array.new(3);
                let b = Array.new(3);
                let b[0] = 7;
                let b[1] = 5;
                let a[b[1] - 4] = b[0] + b[1];
                return a[1];
            }
        }";

        assert_eq!(run(&[main]), Ok(12));
    }

    #[test]
    fn test_array_assignment_with_value_writing_elements() {
        let main = "class Main {
            function int main() {
                var Array a, b;
                let a = Array.new(2);
                let b = Array.new(2);
                let a[1] = Main.fill(b, 9);
                return a[1] + (b[0] * 100);
            }

            function int fill(Array target, int value) {
                let target[0] = value;
                return value + 1;
            }
        }";

        assert_eq!(run(&[main]), Ok(910));
    }

    #[test]
    fn test_while_loop() {
        let main = "class Main {
            function int main() {
                var int i, sum;
                let i = 1;
                while (~(i > 10)) {
                    let sum = sum + i;
                    let i = i + 1;
                }
                return sum;
            }
        }";

        assert_eq!(run(&[main]), Ok(55));
    }

    #[test]
    fn test_recursion() {
        let main = "class Main {
            function int main() { return Main.factorial(6); }

            function int factorial(int n) {
                if (n < 2) { return 1; }
                return n * Main.factorial(n - 1);
            }
        }";

        assert_eq!(run(&[main]), Ok(720));
    }

    #[test]
    fn test_objects_and_methods() {
        let counter = "class Counter {
            field int count;
            static int instances;

            constructor Counter new(int start) {
                let count = start;
                let instances = instances + 1;
                return this;
            }

            method void increment(int by) { let count = count + by; return; }

            method int get() { return count; }

            function int instances() { return instances; }
        }";

        let main = "class Main {
            function int main() {
                var Counter a, b;
                let a = Counter.new(5);
                let b = Counter.new(100);
                do a.increment(3);
                do b.increment(1);
                do a.increment(4);
                return a.get() + (b.get() * Counter.instances());
            }
        }";

        assert_eq!(run(&[counter, main]), Ok(12 + 101 * 2));
    }

    #[test]
    fn test_method_calling_method_on_this() {
        let point = "class Point {
            field int x, y;

            constructor Point new(int ax, int ay) { let x = ax; let y = ay; return this; }

            method int sum() { return x + y; }

            method int doubled() { return sum() + sum(); }
        }";

        let main = "class Main {
            function int main() {
                var Point p;
                let p = Point.new(3, 4);
                return p.doubled();
            }
        }";

        assert_eq!(run(&[point, main]), Ok(14));
    }

    #[test]
    fn test_string_constant() {
        let main = "class Main { function String main() { return \"Hi there\"; } }";

        let mut machine = load(&[main]);
        let address = machine.run("Main.main").expect("program should finish");

        assert_eq!(machine.read_string(address), Ok("Hi there".to_owned()));
    }

    #[test]
    fn test_statics_are_per_class() {
        let a = "class A {
            static int value;
            function int set(int v) { let value = v; return value; }
            function int get() { return value; }
        }";

        let b = "class B {
            static int value;
            function int set(int v) { let value = v; return value; }
        }";

        let main = "class Main {
            function int main() {
                var int ignored;
                let ignored = A.set(1);
                let ignored = B.set(2);
                return A.get();
            }
        }";

        assert_eq!(run(&[a, b, main]), Ok(1));
    }

    #[test]
    fn test_infinite_loop_hits_step_limit() {
        let main = "class Main {
            function int main() { while (true) { } return 0; }
        }";

        assert_eq!(run(&[main]), Err(Fault::StepLimit));
    }

    #[test]
    fn test_unknown_function() {
        let main = "class Main { function int main() { return Missing.f(); } }";

        assert_eq!(
            run(&[main]),
            Err(Fault::UnknownFunction("Missing.f".to_owned()))
        );
    }
}
