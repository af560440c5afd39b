//! Integration tests for polymorphic properties: abstract bases, subtype
//! chaining, derived dispatch and the dispatch cache.

use std::any::Any;

use ferry_engine::{
    adaptable, AdapterError, AdapterOptions, AdapterRegistry, DispatchPolicy, ForeignValue,
    Subtype, Variants,
};
use ferry_runtime::Heap;
use ferry_sdk::{ForeignRuntime, TypeSchema};

trait Shape: Any + std::fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn area(&self) -> f64;
}

type AnyShape = Box<dyn Shape>;
adaptable!(abstract Box<dyn Shape> => "Shape");

#[derive(Debug, Default, Clone, PartialEq)]
struct Circle {
    radius: f64,
}
adaptable!(Circle => "Circle");

impl Shape for Circle {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }
}

impl Subtype<AnyShape> for Circle {
    fn upcast(self) -> AnyShape {
        Box::new(self)
    }

    fn downcast(base: &AnyShape) -> Option<&Self> {
        base.as_any().downcast_ref()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Square {
    side: f64,
}
adaptable!(Square => "Square");

impl Shape for Square {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn area(&self) -> f64 {
        self.side * self.side
    }
}

impl Subtype<AnyShape> for Square {
    fn upcast(self) -> AnyShape {
        Box::new(self)
    }

    fn downcast(base: &AnyShape) -> Option<&Self> {
        base.as_any().downcast_ref()
    }
}

// Known to the foreign side, never listed as an alternative
#[derive(Debug, Default, Clone, PartialEq)]
struct Triangle {
    base: f64,
    height: f64,
}
adaptable!(Triangle => "Triangle");

impl Shape for Triangle {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn area(&self) -> f64 {
        self.base * self.height / 2.0
    }
}

impl Subtype<AnyShape> for Triangle {
    fn upcast(self) -> AnyShape {
        Box::new(self)
    }

    fn downcast(base: &AnyShape) -> Option<&Self> {
        base.as_any().downcast_ref()
    }
}

#[derive(Debug)]
struct Drawing {
    title: String,
    shape: AnyShape,
}
adaptable!(Drawing => "Drawing");

impl Default for Drawing {
    fn default() -> Self {
        Self {
            title: String::new(),
            shape: Box::new(Circle::default()),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn declare_shapes(registry: &mut AdapterRegistry, heap: &Heap) {
    registry.declare::<AnyShape>().unwrap();
    registry.implement::<AnyShape>(heap, None).unwrap();

    registry
        .declare::<Circle>()
        .unwrap()
        .extends::<AnyShape>()
        .unwrap()
        .property("radius", |c: &Circle| c.radius, |c: &mut Circle, v| c.radius = v)
        .unwrap();
    registry
        .declare::<Square>()
        .unwrap()
        .extends::<AnyShape>()
        .unwrap()
        .property("side", |s: &Square| s.side, |s: &mut Square, v| s.side = v)
        .unwrap();
    registry
        .declare::<Triangle>()
        .unwrap()
        .extends::<AnyShape>()
        .unwrap()
        .property("base", |t: &Triangle| t.base, |t: &mut Triangle, v| t.base = v)
        .unwrap()
        .property("height", |t: &Triangle| t.height, |t: &mut Triangle, v| t.height = v)
        .unwrap();
    registry.implement::<Circle>(heap, None).unwrap();
    registry.implement::<Square>(heap, None).unwrap();
    registry.implement::<Triangle>(heap, None).unwrap();
}

fn declare_drawing(registry: &mut AdapterRegistry) {
    registry
        .declare::<Drawing>()
        .unwrap()
        .property("title", |d: &Drawing| d.title.clone(), |d: &mut Drawing, v| d.title = v)
        .unwrap()
        .polymorphic_property(
            "shape",
            |d: &Drawing| &d.shape,
            |d: &mut Drawing, shape| d.shape = shape,
            Variants::<AnyShape>::new()
                .variant::<Circle>()
                .variant::<Square>(),
        )
        .unwrap();
}

fn drawing_registry(heap: &Heap, options: AdapterOptions) -> AdapterRegistry {
    let mut registry = AdapterRegistry::with_options(options);
    declare_shapes(&mut registry, heap);
    declare_drawing(&mut registry);
    registry.implement::<Drawing>(heap, None).unwrap();
    registry
}

fn drawing(title: &str, shape: impl Shape) -> Drawing {
    Drawing {
        title: title.to_string(),
        shape: Box::new(shape),
    }
}

fn shape_field(heap: &Heap, drawing: ForeignValue) -> ForeignValue {
    heap.get_field(drawing, heap.intern("shape")).unwrap().unwrap()
}

fn type_name_of(heap: &Heap, value: ForeignValue) -> String {
    heap.type_name(heap.type_of(value).unwrap()).unwrap()
}

fn shape_cache_len(registry: &AdapterRegistry) -> usize {
    registry
        .adapter::<Drawing>()
        .unwrap()
        .property("shape")
        .unwrap()
        .dispatch_cache_len()
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn test_subtypes_chain_beneath_abstract_base() {
    let heap = Heap::new();
    let mut registry = AdapterRegistry::new();
    declare_shapes(&mut registry, &heap);

    let base = registry.adapter::<AnyShape>().unwrap();
    assert!(base.is_abstract());
    assert!(heap.is_abstract_type(base.type_handle()).unwrap());

    let circle = registry.adapter::<Circle>().unwrap();
    let schema = TypeSchema::from_runtime(&heap, circle.type_handle()).unwrap();
    assert_eq!(schema.supertype(), Some(base.type_handle()));
    assert_eq!(schema.field_names(), &["radius"]);
    assert!(circle.types().contains("Shape"));
}

#[test]
fn test_subtype_needs_implemented_ancestor() {
    let heap = Heap::new();
    let mut registry = AdapterRegistry::new();
    registry.declare::<AnyShape>().unwrap();
    registry
        .declare::<Circle>()
        .unwrap()
        .extends::<AnyShape>()
        .unwrap();

    let err = registry.implement::<Circle>(&heap, None).unwrap_err();
    assert_eq!(
        err,
        AdapterError::UninitializedAdapter {
            type_name: "Shape".to_string()
        }
    );

    registry.implement::<AnyShape>(&heap, None).unwrap();
    registry.implement::<Circle>(&heap, None).unwrap();
}

#[test]
fn test_alternatives_are_registered() {
    let heap = Heap::new();
    let registry = drawing_registry(&heap, AdapterOptions::default());

    let adapter = registry.adapter::<Drawing>().unwrap();
    let shape = adapter.property("shape").unwrap();
    assert!(shape.is_polymorphic());
    assert_eq!(shape.declared_type(), "Shape");
    assert_eq!(shape.alternatives(), vec!["Circle", "Square"]);

    let names: Vec<&str> = adapter.types().names().collect();
    assert_eq!(names, vec!["Drawing", "Circle", "Square"]);
}

// ============================================================================
// Boxing
// ============================================================================

#[test]
fn test_box_uses_dynamic_type() {
    let heap = Heap::new();
    let registry = drawing_registry(&heap, AdapterOptions::default());

    let boxed = registry
        .box_value(&heap, &drawing("box", Square { side: 2.0 }))
        .unwrap();
    let shape = shape_field(&heap, boxed);
    assert_eq!(type_name_of(&heap, shape), "Square");
    assert_eq!(
        heap.get_field(shape, heap.intern("side")).unwrap(),
        Some(ForeignValue::f64(2.0))
    );

    let base = registry.adapter::<AnyShape>().unwrap().type_handle();
    assert!(heap.is_subtype(heap.type_of(shape).unwrap(), base).unwrap());
}

#[test]
fn test_box_undeclared_alternative_falls_to_base() {
    let heap = Heap::new();
    let registry = drawing_registry(&heap, AdapterOptions::default());

    // Triangle is not an alternative, and the abstract base cannot be boxed
    let err = registry
        .box_value(&heap, &drawing("tri", Triangle::default()))
        .unwrap_err();
    assert!(matches!(err, AdapterError::AbstractInstantiation { .. }));
    assert_eq!(heap.gc_pause_depth(), 0);
}

// ============================================================================
// Unboxing
// ============================================================================

#[test]
fn test_unbox_constructs_derived_type() {
    let heap = Heap::new();
    let registry = drawing_registry(&heap, AdapterOptions::default());

    let boxed = registry
        .box_value(&heap, &drawing("round", Circle { radius: 1.5 }))
        .unwrap();
    let back: Drawing = registry.unbox_value(&heap, boxed).unwrap();
    assert_eq!(back.title, "round");
    assert_eq!(
        back.shape.as_any().downcast_ref::<Circle>(),
        Some(&Circle { radius: 1.5 })
    );

    let boxed = registry
        .box_value(&heap, &drawing("square", Square { side: 3.0 }))
        .unwrap();
    let back: Drawing = registry.unbox_value(&heap, boxed).unwrap();
    assert_eq!(back.shape.area(), 9.0);
    assert!(back.shape.as_any().downcast_ref::<Circle>().is_none());
}

#[test]
fn test_dispatch_cache_is_transparent() {
    let heap = Heap::new();
    let registry = drawing_registry(&heap, AdapterOptions::default());
    assert_eq!(shape_cache_len(&registry), 0);

    let squares = registry
        .box_value(&heap, &drawing("a", Square { side: 4.0 }))
        .unwrap();
    let first: Drawing = registry.unbox_value(&heap, squares).unwrap();
    assert_eq!(shape_cache_len(&registry), 1);

    let second: Drawing = registry.unbox_value(&heap, squares).unwrap();
    assert_eq!(shape_cache_len(&registry), 1);
    assert_eq!(
        first.shape.as_any().downcast_ref::<Square>(),
        second.shape.as_any().downcast_ref::<Square>()
    );

    let circles = registry
        .box_value(&heap, &drawing("b", Circle { radius: 1.0 }))
        .unwrap();
    let _: Drawing = registry.unbox_value(&heap, circles).unwrap();
    assert_eq!(shape_cache_len(&registry), 2);
}

#[test]
fn test_unlisted_derived_type_is_mismatch() {
    let heap = Heap::new();
    let registry = drawing_registry(&heap, AdapterOptions::default());

    let boxed = registry
        .box_value(&heap, &drawing("t", Circle::default()))
        .unwrap();
    let triangle = registry
        .box_value(&heap, &Triangle { base: 2.0, height: 3.0 })
        .unwrap();
    heap.set_field(boxed, heap.intern("shape"), triangle).unwrap();

    let err = registry.unbox_value::<Drawing>(&heap, boxed).unwrap_err();
    assert_eq!(
        err,
        AdapterError::TypeMismatch {
            expected: "Shape".to_string(),
            got: "Triangle".to_string()
        }
    );
    // Failures are not memoized
    assert_eq!(shape_cache_len(&registry), 0);
}

#[test]
fn test_fallback_policy_is_opt_in() {
    #[derive(Debug, Default, PartialEq)]
    struct Pen {
        width: i32,
    }
    adaptable!(Pen => "Pen");

    #[derive(Debug, Default, PartialEq)]
    struct Frame {
        border: Pen,
    }
    adaptable!(Frame => "Frame");

    fn frame_registry(heap: &Heap, policy: DispatchPolicy) -> AdapterRegistry {
        let options = AdapterOptions {
            dispatch_policy: policy,
            ..AdapterOptions::default()
        };
        let mut registry = AdapterRegistry::with_options(options);
        registry
            .declare::<Pen>()
            .unwrap()
            .property("width", |p: &Pen| p.width, |p: &mut Pen, v| p.width = v)
            .unwrap();
        registry
            .declare::<Frame>()
            .unwrap()
            .polymorphic_property(
                "border",
                |f: &Frame| &f.border,
                |f: &mut Frame, pen| f.border = pen,
                Variants::<Pen>::new(),
            )
            .unwrap();
        registry.implement::<Pen>(heap, None).unwrap();
        registry.implement::<Frame>(heap, None).unwrap();
        registry
    }

    let heap = Heap::new();
    let strict = frame_registry(&heap, DispatchPolicy::Strict);
    let brush = brush_on(&heap);

    let frame = strict.box_value(&heap, &Frame::default()).unwrap();
    heap.set_field(frame, heap.intern("border"), brush).unwrap();
    let err = strict.unbox_value::<Frame>(&heap, frame).unwrap_err();
    assert!(matches!(err, AdapterError::TypeMismatch { ref got, .. } if got == "Brush"));

    let other_heap = Heap::new();
    let lenient = frame_registry(&other_heap, DispatchPolicy::FallbackToDeclared);
    let brush = brush_on(&other_heap);
    let frame = lenient.box_value(&other_heap, &Frame::default()).unwrap();
    other_heap
        .set_field(frame, other_heap.intern("border"), brush)
        .unwrap();
    let back: Frame = lenient.unbox_value(&other_heap, frame).unwrap();
    assert_eq!(back, Frame { border: Pen { width: 12 } });
}

// Same field layout as Pen, unrelated name
fn brush_on(heap: &Heap) -> ForeignValue {
    let template = heap.allocate_template(heap.intern("Brush")).unwrap();
    heap.set_template_field(template, heap.intern("width"), ForeignValue::i32(12))
        .unwrap();
    let ty = heap.promote_template(template, "Main", false, None).unwrap();
    heap.instantiate(ty).unwrap()
}

// ============================================================================
// Declaration errors
// ============================================================================

#[test]
fn test_conflicting_alternative_rejected() {
    #[derive(Debug, Default)]
    struct FakeCircle;
    adaptable!(FakeCircle => "Circle");

    impl Shape for FakeCircle {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn area(&self) -> f64 {
            0.0
        }
    }

    impl Subtype<AnyShape> for FakeCircle {
        fn upcast(self) -> AnyShape {
            Box::new(self)
        }

        fn downcast(base: &AnyShape) -> Option<&Self> {
            base.as_any().downcast_ref()
        }
    }

    let mut registry = AdapterRegistry::new();
    let err = registry
        .declare::<Drawing>()
        .unwrap()
        .polymorphic_property(
            "shape",
            |d: &Drawing| &d.shape,
            |d: &mut Drawing, shape| d.shape = shape,
            Variants::<AnyShape>::new()
                .variant::<Circle>()
                .variant::<FakeCircle>(),
        )
        .err()
        .unwrap();
    assert!(matches!(err, AdapterError::ConflictingRegistration { ref name, .. } if name == "Circle"));

    // The rejected property left no partial bindings behind
    let builder = registry.declare::<Drawing>().unwrap();
    assert!(builder.property_names().is_empty());
    let names: Vec<&str> = builder.types().names().collect();
    assert_eq!(names, vec!["Drawing"]);
}
