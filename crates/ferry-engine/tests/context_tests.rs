//! Integration tests for the embedding context: closure-style declaration,
//! options from TOML, foreign function calls and shared use across threads.

use ferry_engine::{
    adaptable, AdapterContext, AdapterError, AdapterOptions, DispatchPolicy, ForeignValue,
};
use ferry_runtime::Heap;
use ferry_sdk::{AbiResult, ForeignError, ForeignRuntime, FromForeign, ToForeign};

#[derive(Debug, Default, Clone, PartialEq)]
struct Rgba {
    r: f32,
    g: f32,
    b: f32,
    a: f32,
}
adaptable!(Rgba => "RGBA");

#[derive(Debug, Default, Clone, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}
adaptable!(Point => "Point");

fn declare_rgba(ctx: &AdapterContext<Heap>) {
    ctx.declare::<Rgba, _>(|b| {
        b.property("r", |c: &Rgba| c.r, |c: &mut Rgba, v| c.r = v)?
            .property("g", |c: &Rgba| c.g, |c: &mut Rgba, v| c.g = v)?
            .property("b", |c: &Rgba| c.b, |c: &mut Rgba, v| c.b = v)?
            .property("a", |c: &Rgba| c.a, |c: &mut Rgba, v| c.a = v)?
            .property_get("value", |c: &Rgba| (c.r + c.g + c.b) / 3.0)?;
        Ok(())
    })
    .unwrap();
}

/// Foreign-side `RGBA(r, g, b, a)` constructor
fn rgba_constructor(heap: &Heap, args: &[ForeignValue]) -> AbiResult<ForeignValue> {
    if args.len() != 4 {
        return Err(ForeignError::Call {
            function: "RGBA".to_string(),
            message: format!("expected 4 arguments, got {}", args.len()),
        });
    }
    let mut channels = [0.0f32; 4];
    for (channel, arg) in channels.iter_mut().zip(args) {
        *channel = f32::from_foreign(*arg, heap)?;
    }

    let value = heap.instantiate(heap.type_by_name("RGBA")?)?;
    for (name, channel) in ["r", "g", "b", "a"].iter().zip(channels) {
        heap.set_field(value, heap.intern(name), channel.to_foreign(heap)?)?;
    }
    let average = (channels[0] + channels[1] + channels[2]) / 3.0;
    heap.set_field(value, heap.intern("value"), ForeignValue::f32(average))?;
    Ok(value)
}

#[test]
fn test_declare_implement_round_trip() {
    let ctx = AdapterContext::new(Heap::new());
    declare_rgba(&ctx);
    assert!(!ctx.is_implemented::<Rgba>());
    ctx.implement::<Rgba>(None).unwrap();
    assert!(ctx.is_implemented::<Rgba>());

    let color = Rgba {
        r: 0.1,
        g: 0.2,
        b: 0.3,
        a: 0.4,
    };
    let boxed = ctx.box_value(&color).unwrap();
    assert_eq!(ctx.unbox_value::<Rgba>(boxed).unwrap(), color);
    assert_eq!(ctx.runtime().gc_pause_depth(), 0);
}

#[test]
fn test_box_before_implement_fails() {
    let ctx = AdapterContext::new(Heap::new());
    declare_rgba(&ctx);
    let err = ctx.box_value(&Rgba::default()).unwrap_err();
    assert!(matches!(err, AdapterError::UninitializedAdapter { .. }));
    assert!(!ctx.is_implemented::<Rgba>());
}

#[test]
fn test_foreign_constructor_result_unboxes() {
    let heap = Heap::new();
    heap.define_function("RGBA", rgba_constructor);
    let ctx = AdapterContext::new(heap);
    declare_rgba(&ctx);
    ctx.implement::<Rgba>(None).unwrap();

    let args = [
        ForeignValue::f32(0.25),
        ForeignValue::f32(0.5),
        ForeignValue::f32(0.75),
        ForeignValue::f32(1.0),
    ];
    let value = ctx.call("RGBA", &args).unwrap();
    let color: Rgba = ctx.unbox_value(value).unwrap();
    assert_eq!(
        color,
        Rgba {
            r: 0.25,
            g: 0.5,
            b: 0.75,
            a: 1.0
        }
    );

    let runtime = ctx.runtime();
    let average = runtime.get_field(value, runtime.intern("value")).unwrap();
    assert_eq!(average, Some(ForeignValue::f32(0.5)));
}

#[test]
fn test_call_errors_are_translated() {
    let heap = Heap::new();
    heap.define_function("RGBA", rgba_constructor);
    let ctx = AdapterContext::new(heap);
    declare_rgba(&ctx);
    ctx.implement::<Rgba>(None).unwrap();

    let err = ctx.call("HSV", &[]).unwrap_err();
    assert_eq!(
        err,
        AdapterError::ForeignRuntimeFailure(ForeignError::UnknownFunction("HSV".to_string()))
    );

    let err = ctx.call("RGBA", &[ForeignValue::f32(1.0)]).unwrap_err();
    assert!(matches!(
        err,
        AdapterError::ForeignRuntimeFailure(ForeignError::Call { .. })
    ));

    let args = [ForeignValue::i32(1); 4];
    let err = ctx.call("RGBA", &args).unwrap_err();
    assert!(matches!(err, AdapterError::TypeMismatch { ref expected, .. } if expected == "Float32"));
    assert_eq!(ctx.runtime().gc_pause_depth(), 0);
}

#[test]
fn test_options_from_toml() {
    let options = AdapterOptions::from_toml_str(
        r#"
[adapter]
default_module = "Colors"
dispatch_policy = "strict"
"#,
    )
    .unwrap();
    assert_eq!(options.dispatch_policy, DispatchPolicy::Strict);

    let ctx = AdapterContext::with_options(Heap::new(), options);
    declare_rgba(&ctx);
    ctx.implement::<Rgba>(None).unwrap();

    let registry = ctx.registry();
    let adapter = registry.adapter::<Rgba>().unwrap();
    assert_eq!(adapter.module(), "Colors");
    let descriptor = ctx.runtime().descriptor(adapter.type_handle()).unwrap();
    assert_eq!(descriptor.module, "Colors");
}

#[test]
fn test_explicit_module_overrides_default() {
    let ctx = AdapterContext::new(Heap::new());
    declare_rgba(&ctx);
    ctx.implement::<Rgba>(Some("Paint")).unwrap();
    assert_eq!(ctx.registry().adapter::<Rgba>().unwrap().module(), "Paint");
}

#[test]
fn test_context_shared_across_threads() {
    let ctx = AdapterContext::new(Heap::new());
    ctx.declare::<Point, _>(|b| {
        b.property("x", |p: &Point| p.x, |p: &mut Point, v| p.x = v)?
            .property("y", |p: &Point| p.y, |p: &mut Point, v| p.y = v)?;
        Ok(())
    })
    .unwrap();
    ctx.implement::<Point>(None).unwrap();

    std::thread::scope(|scope| {
        for t in 0..4 {
            let ctx = &ctx;
            scope.spawn(move || {
                for i in 0..25 {
                    let point = Point { x: t, y: i };
                    let boxed = ctx.box_value(&point).unwrap();
                    assert_eq!(ctx.unbox_value::<Point>(boxed).unwrap(), point);
                }
            });
        }
    });

    assert_eq!(ctx.runtime().gc_pause_depth(), 0);
}
