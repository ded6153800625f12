pub mod creators;
pub mod crossover;
pub mod diversity;
pub mod evolution_engine;
pub mod fitness_cache;
pub mod hall_of_fame;
pub mod mutation;
pub mod operators;
pub mod progress;
pub mod validator;

pub use creators::{create_terminal, FullCreator, GrowCreator, RampedHalfAndHalfCreator, TreeCreator};
pub use crossover::{Crossover, OnePointCrossover, SubtreeCrossover, UniformCrossover};
pub use diversity::{DiversityValidator, PopulationDiversity};
pub use evolution_engine::{EngineState, EvolutionEngine, StopHandle, StopPredicate};
pub use fitness_cache::FitnessCache;
pub use hall_of_fame::{HallOfFame, HallOfFameEntry};
pub use mutation::{ChangeNodeTypeMutator, ChangeTerminalMutator, MultiMutator, Mutator, SubtreeMutator};
pub use operators::{best_index, compare_fitness, RouletteSelector, Selector, TournamentSelector};
pub use progress::{ChannelProgressCallback, ConsoleProgressCallback, NullProgress, ProgressCallback, ProgressMessage};
pub use validator::TreeValidator;
