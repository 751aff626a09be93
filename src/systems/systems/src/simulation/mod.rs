use crate::shared::MachNumber;
use fxhash::FxHashMap;
use uom::si::{f64::*, length::foot, velocity::knot};


/// Identifies a named variable on the simulator bus. Identifiers are handed out by the
/// [`VariableRegistry`] during initialisation and are cheap to copy around afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableIdentifier(usize);

impl VariableIdentifier {
    pub fn new(index: usize) -> Self {
        Self(index)
    }
}

#[derive(Default)]
pub struct VariableRegistry {
    identifiers: FxHashMap<String, VariableIdentifier>,
    next_index: usize,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identifier for the given name, registering it on first use. Asking twice for
    /// the same name yields the same identifier.
    pub fn get(&mut self, name: String) -> VariableIdentifier {
        if let Some(identifier) = self.identifiers.get(&name) {
            return *identifier;
        }

        let identifier = VariableIdentifier::new(self.next_index);
        self.next_index += 1;
        tracing::trace!(%name, ?identifier, "registered variable");
        self.identifiers.insert(name, identifier);

        identifier
    }

    pub fn find(&self, name: &str) -> Option<VariableIdentifier> {
        self.identifiers.get(name).copied()
    }
}

pub struct InitContext<'a> {
    registry: &'a mut VariableRegistry,
}

impl<'a> InitContext<'a> {
    pub fn new(registry: &'a mut VariableRegistry) -> Self {
        Self { registry }
    }

    pub fn get_identifier(&mut self, name: String) -> VariableIdentifier {
        self.registry.get(name)
    }
}

/// The transport behind the simulator bus. Values travel as `f64`, typed conversions happen
/// in [`Read`] and [`Write`].
pub trait SimulatorReaderWriter {
    fn read(&mut self, identifier: &VariableIdentifier) -> f64;
    fn write(&mut self, identifier: &VariableIdentifier, value: f64);
}

pub trait Reader {
    fn read_f64(&mut self, identifier: &VariableIdentifier) -> f64;
}

pub trait Writer {
    fn write_f64(&mut self, identifier: &VariableIdentifier, value: f64);
}

pub struct SimulatorReader<'a> {
    reader_writer: &'a mut dyn SimulatorReaderWriter,
}

impl<'a> SimulatorReader<'a> {
    pub fn new(reader_writer: &'a mut dyn SimulatorReaderWriter) -> Self {
        Self { reader_writer }
    }
}

impl<'a> Reader for SimulatorReader<'a> {
    fn read_f64(&mut self, identifier: &VariableIdentifier) -> f64 {
        self.reader_writer.read(identifier)
    }
}

pub struct SimulatorWriter<'a> {
    reader_writer: &'a mut dyn SimulatorReaderWriter,
}

impl<'a> SimulatorWriter<'a> {
    pub fn new(reader_writer: &'a mut dyn SimulatorReaderWriter) -> Self {
        Self { reader_writer }
    }
}

impl<'a> Writer for SimulatorWriter<'a> {
    fn write_f64(&mut self, identifier: &VariableIdentifier, value: f64) {
        self.reader_writer.write(identifier, value);
    }
}

pub trait Read<T> {
    fn read(&mut self, identifier: &VariableIdentifier) -> T;
}

pub trait Write<T> {
    fn write(&mut self, identifier: &VariableIdentifier, value: T);
}

impl<T: Reader> Read<bool> for T {
    fn read(&mut self, identifier: &VariableIdentifier) -> bool {
        crate::shared::to_bool(self.read_f64(identifier))
    }
}

impl<T: Reader> Read<u8> for T {
    fn read(&mut self, identifier: &VariableIdentifier) -> u8 {
        let value = self.read_f64(identifier);
        if value.is_finite() && value >= 0. && value <= u8::MAX as f64 {
            value.round() as u8
        } else {
            0
        }
    }
}

impl<T: Reader> Read<Velocity> for T {
    fn read(&mut self, identifier: &VariableIdentifier) -> Velocity {
        Velocity::new::<knot>(self.read_f64(identifier))
    }
}

impl<T: Reader> Read<MachNumber> for T {
    fn read(&mut self, identifier: &VariableIdentifier) -> MachNumber {
        MachNumber(self.read_f64(identifier))
    }
}

impl<T: Writer> Write<f64> for T {
    fn write(&mut self, identifier: &VariableIdentifier, value: f64) {
        self.write_f64(identifier, value);
    }
}

impl<T: Writer> Write<bool> for T {
    fn write(&mut self, identifier: &VariableIdentifier, value: bool) {
        self.write_f64(identifier, if value { 1. } else { 0. });
    }
}

impl<T: Writer> Write<u8> for T {
    fn write(&mut self, identifier: &VariableIdentifier, value: u8) {
        self.write_f64(identifier, value as f64);
    }
}

impl<T: Writer> Write<Length> for T {
    fn write(&mut self, identifier: &VariableIdentifier, value: Length) {
        self.write_f64(identifier, value.get::<foot>());
    }
}

/// Airspeeds travel in knots.
impl<T: Writer> Write<Velocity> for T {
    fn write(&mut self, identifier: &VariableIdentifier, value: Velocity) {
        self.write_f64(identifier, value.get::<knot>());
    }
}

/// Trait for elements that exchange state with the simulator bus. Every element reads its
/// inputs before any element updates, and writes its outputs after all elements updated.
///
/// Composite elements override [`SimulationElement::accept`] to visit their children before
/// visiting themselves.
pub trait SimulationElement {
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T)
    where
        Self: Sized,
    {
        visitor.visit(self);
    }

    fn read(&mut self, _reader: &mut SimulatorReader) {}

    fn write(&self, _writer: &mut SimulatorWriter) {}
}

pub trait SimulationElementVisitor {
    fn visit<T: SimulationElement>(&mut self, visited: &mut T);
}

/// Hands the simulator state to every visited element.
pub struct SimulatorToSimulationVisitor<'a> {
    reader: SimulatorReader<'a>,
}

impl<'a> SimulatorToSimulationVisitor<'a> {
    pub fn new(reader_writer: &'a mut dyn SimulatorReaderWriter) -> Self {
        Self {
            reader: SimulatorReader::new(reader_writer),
        }
    }
}

impl<'a> SimulationElementVisitor for SimulatorToSimulationVisitor<'a> {
    fn visit<T: SimulationElement>(&mut self, visited: &mut T) {
        visited.read(&mut self.reader);
    }
}

/// Collects the outputs of every visited element into the simulator.
pub struct SimulationToSimulatorVisitor<'a> {
    writer: SimulatorWriter<'a>,
}

impl<'a> SimulationToSimulatorVisitor<'a> {
    pub fn new(reader_writer: &'a mut dyn SimulatorReaderWriter) -> Self {
        Self {
            writer: SimulatorWriter::new(reader_writer),
        }
    }
}

impl<'a> SimulationElementVisitor for SimulationToSimulatorVisitor<'a> {
    fn visit<T: SimulationElement>(&mut self, visited: &mut T) {
        visited.write(&mut self.writer);
    }
}
