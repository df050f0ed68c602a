use anyhow::{bail, Context, Result};
use caption_beam::core::decode::{prediction_file_name, write_predictions};
use caption_beam::{decode_batch, BigramDecoder, DecodeConfig, DecodeStrategy, StepDecoder, Vocabulary};
use chrono::Local;
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::info;
use std::fs;
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("caption_decode")
        .version("0.1.0")
        .about("빔 탐색으로 이미지 캡션 생성")
        .arg(
            Arg::new("vocab")
                .long("vocab")
                .value_name("FILE")
                .required(true)
                .help("어휘 사전 JSON 파일")
        )
        .arg(
            Arg::new("model")
                .long("model")
                .short('m')
                .value_name("NAME=FILE")
                .required(true)
                .action(ArgAction::Append)
                .help("이미지 이름과 바이그램 모델 JSON 파일 (반복 가능)")
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("디코딩 설정 JSON 파일")
        )
        .arg(
            Arg::new("beam-size")
                .long("beam-size")
                .short('k')
                .value_name("SIZE")
                .value_parser(clap::value_parser!(usize))
                .help("빔 크기")
        )
        .arg(
            Arg::new("max-len")
                .long("max-len")
                .value_name("STEPS")
                .value_parser(clap::value_parser!(usize))
                .help("최대 생성 단계 수")
        )
        .arg(
            Arg::new("greedy")
                .long("greedy")
                .action(ArgAction::SetTrue)
                .help("빔 탐색 대신 그리디 디코딩")
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("DIR")
                .help("예측 파일 출력 디렉토리")
        )
        .arg(
            Arg::new("split")
                .long("split")
                .value_name("NAME")
                .default_value("test")
                .help("예측 파일 이름에 붙일 데이터 분할 이름")
        )
        .arg(
            Arg::new("epoch")
                .long("epoch")
                .value_name("EPOCH")
                .value_parser(clap::value_parser!(usize))
                .default_value("0")
                .help("예측 파일 이름에 붙일 에포크")
        )
        .get_matches();

    run(&matches)
}

fn run(matches: &ArgMatches) -> Result<()> {
    let vocab_path = PathBuf::from(required(matches, "vocab")?);
    let vocab = Vocabulary::load(&vocab_path)
        .with_context(|| format!("어휘 사전 로드 실패: {}", vocab_path.display()))?;
    let special = vocab.special_tokens();

    let config = build_config(matches)?;
    info!("decode config: {:?}", config);

    let mut jobs = Vec::new();
    for entry in matches.get_many::<String>("model").into_iter().flatten() {
        let (name, path) = entry
            .split_once('=')
            .with_context(|| format!("--model 은 NAME=FILE 형식이어야 합니다: {}", entry))?;
        let decoder = BigramDecoder::from_json_file(&PathBuf::from(path))
            .with_context(|| format!("모델 로드 실패: {}", path))?;
        if decoder.vocab_size() != vocab.len() {
            bail!(
                "모델 {} 의 어휘 크기 {} 가 사전 크기 {} 와 다릅니다",
                path,
                decoder.vocab_size(),
                vocab.len()
            );
        }
        jobs.push((name.to_string(), decoder));
    }

    let results = decode_batch(jobs, &config, special).context("디코딩 실패")?;

    let mut predictions = Vec::with_capacity(results.len());
    for (name, hyp) in results {
        let words = vocab.decode(hyp.caption_tokens(special));
        println!("{}\t{}\t({:.4})", name, words.join(" "), hyp.score);
        predictions.push((name, words));
    }

    if let Some(dir) = matches.get_one::<String>("output") {
        let dir = PathBuf::from(dir);
        fs::create_dir_all(&dir)
            .with_context(|| format!("출력 디렉토리 생성 실패: {}", dir.display()))?;

        let tag = match config.strategy {
            DecodeStrategy::Beam => "beam",
            DecodeStrategy::Greedy => "greedy",
        };
        let split = required(matches, "split")?;
        let epoch = matches.get_one::<usize>("epoch").copied().unwrap_or(0);
        let path = dir.join(prediction_file_name(split, epoch, tag, &Local::now()));

        write_predictions(&path, &predictions)
            .with_context(|| format!("예측 파일 쓰기 실패: {}", path.display()))?;
        println!("💾 예측 파일: {}", path.display());
    }

    Ok(())
}

fn build_config(matches: &ArgMatches) -> Result<DecodeConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => DecodeConfig::from_json_file(&PathBuf::from(path))
            .with_context(|| format!("설정 로드 실패: {}", path))?,
        None => DecodeConfig::default(),
    };

    if let Some(&beam_size) = matches.get_one::<usize>("beam-size") {
        config.beam_size = beam_size;
    }
    if let Some(&max_len) = matches.get_one::<usize>("max-len") {
        config.max_sentence_length = max_len;
    }
    if matches.get_flag("greedy") {
        config.strategy = DecodeStrategy::Greedy;
    }

    config.validate()?;
    Ok(config)
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("--{} 값이 필요합니다", id))
}
