//! Memory test harness for [`rbuddy::Arena`].
//!
//! Reimplements `memtest.c`'s flag set and pre-tests against the buddy
//! arena instead of the original's global-state allocator. `ackerman_main`'s
//! workload isn't part of the retrieved source, so it's replaced here with
//! a doubling allocate/free workload that exercises the same kind of
//! "allocate on the way down, free on the way back up" recursion shape.
//!
//! ```text
//! Commands:
//! -b : Basic Block Size to use in this test.
//! -s : Memory Size in Bytes to use in this test.
//! -k : Memory Size in Kilobytes to use in this test.
//! -m : Memory Size in Megabytes to use in this test.
//! -t : Identifier of a pre-test to run (1=maw, 2=for, 3=recursive).
//! -x : First parameter of the pre-test.
//! -y : Second parameter of the pre-test.
//! -z : When to run the pre-test relative to the main workload (0=before, 1=after).
//!
//! Example: memtest -b 5 -m 128
//! ```

use rbuddy::Arena;

struct Options {
  memory_size: usize,
  basic_block_size: usize,
  test_identifier: u32,
  test_param_a: usize,
  test_param_b: usize,
  test_after_main_workload: bool,
}

impl Default for Options {
  fn default() -> Self {
    Options {
      memory_size: 512 * 1024,
      basic_block_size: 128,
      test_identifier: 0,
      test_param_a: 2,
      test_param_b: 128 * 1024,
      test_after_main_workload: false,
    }
  }
}

fn build_options(
  args: &[String],
) -> Result<Options, String> {
  let mut options = Options::default();
  let mut i = 0;
  while i < args.len() {
    let flag = &args[i];
    let value = args.get(i + 1).ok_or_else(|| format!("missing value for {flag}"))?;
    let parsed: usize = value.parse().map_err(|_| format!("invalid number for {flag}: {value}"))?;

    match flag.as_str() {
      "-b" => options.basic_block_size = parsed,
      "-s" => options.memory_size = parsed,
      "-k" => options.memory_size = parsed * 1024,
      "-m" => options.memory_size = parsed * 1024 * 1024,
      "-t" => options.test_identifier = parsed as u32,
      "-x" => options.test_param_a = parsed,
      "-y" => options.test_param_b = parsed,
      "-z" => options.test_after_main_workload = parsed != 0,
      other => return Err(format!("unrecognized flag: {other}")),
    }
    i += 2;
  }
  Ok(options)
}

/// Rapidly consumes `size`-byte blocks until the arena is exhausted. The
/// best exerciser of bucket splitting: every allocation forces a search
/// further and further up the bucket chain.
fn maw_test(
  arena: &mut Arena,
  size: usize,
) {
  let mut count = 0usize;
  while !arena.malloc(size).is_null() {
    count += 1;
  }
  println!("maw_test: exhausted arena after {count} allocations of {size} bytes");
}

/// Allocates exponentially larger blocks, `1 << i` bytes for `i` in
/// `0..max_index`, optionally freeing each immediately.
fn for_test(
  arena: &mut Arena,
  max_index: u32,
  free_immediately: bool,
) {
  for i in 0..max_index {
    let size = 1usize << i;
    let p = arena.malloc(size);
    if free_immediately {
      arena.free(p);
    }
  }
  println!("for_test: ran through sizes 1..1<<{max_index}");
}

/// Allocates `memory`, recurses with double the size until `ending_memory`
/// is reached, then frees on the way back out — exercising long-lived
/// allocations that all free in LIFO order.
fn recursive_test(
  arena: &mut Arena,
  memory: usize,
  ending_memory: usize,
) {
  let p = arena.malloc(memory);
  if p.is_null() {
    return;
  }
  if memory < ending_memory {
    recursive_test(arena, memory * 2, ending_memory);
  }
  arena.free(p);
}

fn run_test(
  arena: &mut Arena,
  options: &Options,
) {
  println!(
    "Running Test({}): A({}) B({})",
    options.test_identifier, options.test_param_a, options.test_param_b
  );
  match options.test_identifier {
    1 => maw_test(arena, options.test_param_a),
    2 => for_test(arena, options.test_param_a as u32, options.test_param_b != 0),
    3 => recursive_test(arena, options.test_param_a, options.test_param_b),
    _ => {}
  }
}

/// Allocates progressively larger blocks, holding each until a matching
/// deallocation unwinds, rather than calling the (unavailable) original
/// Ackermann workload.
fn doubling_workload(
  arena: &mut Arena,
  starting_size: usize,
  rounds: u32,
) {
  let mut held = Vec::new();
  let mut size = starting_size.max(1);
  for _ in 0..rounds {
    let p = arena.malloc(size);
    if p.is_null() {
      break;
    }
    held.push(p);
    size *= 2;
  }
  while let Some(p) = held.pop() {
    arena.free(p);
  }
}

fn main() {
  let args: Vec<String> = std::env::args().skip(1).collect();
  let options = match build_options(&args) {
    Ok(options) => options,
    Err(message) => {
      eprintln!("memtest: {message}");
      std::process::exit(1);
    }
  };

  println!("rbuddy memory test\n");
  println!("Commands:");
  println!("-b : Basic Block Size to use in this test.");
  println!("-s : Memory Size in Bytes to use in this test.");
  println!("-k : Memory Size in Kilobytes to use in this test.");
  println!("-m : Memory Size in Megabytes to use in this test.");
  println!("-t : Identifier of a pre-test to run (1=maw, 2=for, 3=recursive).");
  println!("-x : First parameter of the pre-test.");
  println!("-y : Second parameter of the pre-test.");
  println!("-z : When to run the pre-test relative to the main workload.");
  println!("Example: memtest -b 5 -m 128\n");

  println!(
    "memtest options:\n - memory: ~{} KB\n - block size: {} B\n - testId: {}\n",
    options.memory_size / 1024,
    options.basic_block_size,
    options.test_identifier
  );

  let (arena, bytes) = Arena::init(options.basic_block_size, options.memory_size);
  let mut arena = match arena {
    Some(arena) => arena,
    None => {
      eprintln!("memtest: failed to initialize a {} byte arena", options.memory_size);
      std::process::exit(1);
    }
  };
  println!("initialized arena with {bytes} bytes");

  if options.test_identifier > 0 && !options.test_after_main_workload {
    run_test(&mut arena, &options);
  }

  doubling_workload(&mut arena, options.basic_block_size, 16);

  if options.test_identifier > 0 && options.test_after_main_workload {
    run_test(&mut arena, &options);
  }

  let status = arena.release();
  println!("release_allocator returned {status}");
}
