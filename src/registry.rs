// Copyright 2025 Cowboy AI, LLC.

//! Named specifications and the process-wide registry that holds them
//!
//! A named specification is a type wrapping one fixed [`Specification`].
//! Instances are built lazily on first request and shared afterwards: every
//! request for the same type, from any thread, returns the same `Arc`.
//!
//! ```rust
//! use cim_specification::{expression::Member, named_specification, spec};
//!
//! pub struct Invoice { amount: i64 }
//!
//! named_specification! {
//!     /// Invoices that need a second approval
//!     pub LargeInvoice: Invoice = |i| i.member(Member::integer("amount", |v: &Invoice| v.amount)).ge(10_000)
//! }
//!
//! let large = spec::<LargeInvoice>().unwrap();
//! assert!(large.is_satisfied(&Invoice { amount: 12_500 }).unwrap());
//! assert!(std::sync::Arc::ptr_eq(&large, &spec::<LargeInvoice>().unwrap()));
//! ```

use std::any::{Any, TypeId};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::errors::{SpecificationError, SpecificationResult};
use crate::specification::{IntoOperand, Operand, Specification};

/// A specification type with a single shared instance
///
/// Usually declared with [`named_specification!`](crate::named_specification);
/// implement it by hand when construction can fail or needs other
/// registered specifications.
pub trait NamedSpecification: Sized + Send + Sync + 'static {
    /// Domain type the specification tests
    type Candidate: 'static;

    /// Name used in logs and construction errors
    const NAME: &'static str;

    /// Build the instance; called at most once per successful registration
    fn build() -> SpecificationResult<Self>;

    /// The wrapped specification
    fn specification(&self) -> &Specification<Self::Candidate>;
}

type Instance = Arc<dyn Any + Send + Sync>;
type Slot = Arc<Mutex<Option<Instance>>>;

/// Lazily built, shared instances of named specifications
///
/// Each type gets its own slot. Construction holds only that slot's lock,
/// so building one variant never blocks requests for another, and a
/// variant may request other variants while it is being built. A variant
/// must not request itself from its own `build`.
#[derive(Debug, Default)]
pub struct SpecificationRegistry {
    slots: DashMap<TypeId, Slot>,
}

static GLOBAL: LazyLock<SpecificationRegistry> = LazyLock::new(SpecificationRegistry::new);

impl SpecificationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// The process-wide registry used by [`spec`]
    pub fn global() -> &'static SpecificationRegistry {
        &GLOBAL
    }

    /// Shared instance of `V`, building it on first request
    ///
    /// A failed build is reported as
    /// [`SpecificationError::ConstructionFailure`] and leaves nothing cached;
    /// the next request tries again.
    pub fn get_or_create<V: NamedSpecification>(&self) -> SpecificationResult<Arc<V>> {
        // The map guard is released before the slot is locked.
        let slot = Arc::clone(self.slots.entry(TypeId::of::<V>()).or_default().value());
        let mut instance = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = instance.as_ref() {
            return downcast::<V>(Arc::clone(existing));
        }

        debug!(specification = V::NAME, "constructing named specification");
        match V::build() {
            Ok(built) => {
                let built = Arc::new(built);
                *instance = Some(Arc::clone(&built) as Instance);
                Ok(built)
            }
            Err(source) => {
                warn!(
                    specification = V::NAME,
                    error = %source,
                    "named specification construction failed"
                );
                Err(SpecificationError::ConstructionFailure {
                    variant: V::NAME,
                    source: Box::new(source),
                })
            }
        }
    }

    /// Shared instance of `V` if it has already been built
    pub fn get<V: NamedSpecification>(&self) -> Option<Arc<V>> {
        let slot = self
            .slots
            .get(&TypeId::of::<V>())
            .map(|entry| Arc::clone(entry.value()))?;
        let instance = slot.lock().unwrap_or_else(PoisonError::into_inner);
        instance
            .as_ref()
            .and_then(|existing| Arc::clone(existing).downcast::<V>().ok())
    }

    /// Whether `V` has been built
    pub fn contains<V: NamedSpecification>(&self) -> bool {
        self.get::<V>().is_some()
    }

    /// Number of built instances
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = self
            .slots
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        slots
            .iter()
            .filter(|slot| {
                slot.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some()
            })
            .count()
    }

    /// Whether no instance has been built
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: NamedSpecification> IntoOperand<V::Candidate> for &Arc<V> {
    const ARGUMENT: &'static str = "target";

    fn into_operand(self) -> Operand<V::Candidate> {
        IntoOperand::into_operand(self.specification())
    }
}

fn downcast<V: NamedSpecification>(instance: Instance) -> SpecificationResult<Arc<V>> {
    instance.downcast::<V>().map_err(|_| {
        SpecificationError::InternalError(format!(
            "registry slot for {} holds another type",
            V::NAME
        ))
    })
}

/// Shared instance of `V` from the global registry
pub fn spec<V: NamedSpecification>() -> SpecificationResult<Arc<V>> {
    SpecificationRegistry::global().get_or_create::<V>()
}

/// Declare a named specification type
///
/// Two forms are accepted. The lambda form gives the placeholder name and
/// the body; the block form evaluates to a [`Specification`] and may use
/// `?` on [`SpecificationResult`]s.
///
/// ```rust
/// use cim_specification::{expression::Member, named_specification, not, spec};
///
/// pub struct Shipment { weight: i64 }
///
/// fn weight() -> Member<Shipment> {
///     Member::integer("weight", |s: &Shipment| s.weight)
/// }
///
/// named_specification! {
///     pub Oversize: Shipment = |s| s.member(weight()).gt(30)
/// }
///
/// named_specification! {
///     pub Standard: Shipment => { not(&spec::<Oversize>()?)? }
/// }
///
/// let standard = spec::<Standard>().unwrap();
/// assert!(standard.is_satisfied(&Shipment { weight: 12 }).unwrap());
/// ```
///
/// The generated type dereferences to its [`Specification`] and can be
/// passed by reference, or as `&Arc<_>`, to any combinator.
#[macro_export]
macro_rules! named_specification {
    (
        $(#[$meta:meta])*
        $vis:vis $name:ident : $candidate:ty = |$param:ident| $body:expr $(;)?
    ) => {
        $crate::named_specification! {
            $(#[$meta])*
            $vis $name : $candidate => {
                $crate::Specification::from_fn(
                    stringify!($param),
                    |$param: $crate::expression::Expr<$candidate>| $body,
                )
            }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis $name:ident : $candidate:ty => $build:block
    ) => {
        $(#[$meta])*
        $vis struct $name($crate::Specification<$candidate>);

        impl $crate::NamedSpecification for $name {
            type Candidate = $candidate;

            const NAME: &'static str = stringify!($name);

            fn build() -> $crate::SpecificationResult<Self> {
                Ok(Self($build))
            }

            fn specification(&self) -> &$crate::Specification<$candidate> {
                &self.0
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::Specification<$candidate>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl $crate::IntoOperand<$candidate> for &$name {
            const ARGUMENT: &'static str = "target";

            fn into_operand(self) -> $crate::Operand<$candidate> {
                $crate::IntoOperand::into_operand(&self.0)
            }
        }

    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Member;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    struct Ticket {
        priority: i64,
    }

    fn priority() -> Member<Ticket> {
        Member::integer("priority", |t: &Ticket| t.priority)
    }

    crate::named_specification! {
        Urgent: Ticket = |t| t.member(priority()).ge(8)
    }

    crate::named_specification! {
        Routine: Ticket => { crate::not(&Specification::from_fn("t", |t| t.member(priority()).ge(8)))? }
    }

    #[test]
    fn test_same_instance_is_returned() {
        let registry = SpecificationRegistry::new();
        let first = registry.get_or_create::<Urgent>().unwrap();
        let second = registry.get_or_create::<Urgent>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.is_satisfied(&Ticket { priority: 9 }).unwrap());
    }

    #[test]
    fn test_instances_are_built_lazily() {
        let registry = SpecificationRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get::<Urgent>().is_none());

        registry.get_or_create::<Routine>().unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.contains::<Routine>());
        assert!(!registry.contains::<Urgent>());
    }

    #[test]
    fn test_generated_type_is_an_operand() {
        let registry = SpecificationRegistry::new();
        let urgent = registry.get_or_create::<Urgent>().unwrap();
        let routine = registry.get_or_create::<Routine>().unwrap();

        let either = urgent.or(&routine).unwrap();
        assert!(either.is_satisfied(&Ticket { priority: 1 }).unwrap());
        assert!(urgent.xor(&*routine).unwrap().is_satisfied(&Ticket { priority: 9 }).unwrap());
        assert_eq!(Urgent::NAME, "Urgent");
        assert_eq!(format!("{:?}", *urgent), "Urgent(|t| (t.priority >= 8))");
    }

    static FLAKY_ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug)]
    struct Flaky(Specification<Ticket>);

    impl NamedSpecification for Flaky {
        type Candidate = Ticket;
        const NAME: &'static str = "Flaky";

        fn build() -> SpecificationResult<Self> {
            if FLAKY_ATTEMPTS.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(SpecificationError::MissingExpression);
            }
            Ok(Self(Specification::from_fn("t", |t| t.member(priority()).lt(3))))
        }

        fn specification(&self) -> &Specification<Ticket> {
            &self.0
        }
    }

    #[test]
    fn test_failed_construction_is_not_cached() {
        let registry = SpecificationRegistry::new();

        let err = registry.get_or_create::<Flaky>().unwrap_err();
        assert_eq!(
            err,
            SpecificationError::ConstructionFailure {
                variant: "Flaky",
                source: Box::new(SpecificationError::MissingExpression),
            }
        );
        assert!(registry.is_empty());

        let retried = registry.get_or_create::<Flaky>().unwrap();
        assert!(retried.specification().is_satisfied(&Ticket { priority: 1 }).unwrap());
        assert_eq!(FLAKY_ATTEMPTS.load(Ordering::SeqCst), 2);
    }

    static CONTENDED_BUILDS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug)]
    struct Contended(Specification<Ticket>);

    impl NamedSpecification for Contended {
        type Candidate = Ticket;
        const NAME: &'static str = "Contended";

        fn build() -> SpecificationResult<Self> {
            CONTENDED_BUILDS.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            Ok(Self(Specification::from_fn("t", |t| t.member(priority()).equal(5))))
        }

        fn specification(&self) -> &Specification<Ticket> {
            &self.0
        }
    }

    #[test]
    fn test_concurrent_requests_build_once() {
        let registry = SpecificationRegistry::new();
        let barrier = Barrier::new(8);

        let instances: Vec<Arc<Contended>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        registry.get_or_create::<Contended>().unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(CONTENDED_BUILDS.load(Ordering::SeqCst), 1);
        assert!(instances.iter().all(|i| Arc::ptr_eq(i, &instances[0])));
    }
}
